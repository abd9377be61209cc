pub mod command;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bot::command::{Command, parse};
use crate::feed::PriceFeed;
use crate::model::{Subscriber, WatchCondition};
use crate::registry::AlertRegistry;
use crate::telegram::{TelegramClient, Update};

const MAX_BACKOFF_SECS: u64 = 60;

const WELCOME_TEXT: &str = "Welcome to the Crypto Price Bot! \
Use /price <crypto_id> to check prices.\n\
Example: /price bitcoin\n\n\
Use /alert <crypto_id> <target_price> to set alerts.";

/// Long-poll the Bot API and dispatch each update to its own handler task.
///
/// Poll failures retry with capped exponential backoff and never kill the
/// loop; handler tasks run concurrently and only touch the registry
/// through its interface.
pub async fn run(
    client: Arc<TelegramClient>,
    registry: Arc<AlertRegistry>,
    feed: Arc<dyn PriceFeed>,
    currency: String,
    poll_timeout_secs: u64,
    cancel: CancellationToken,
) {
    let mut offset = 0i64;
    let mut backoff = Duration::from_secs(1);

    info!("bot update polling started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("bot poller cancelled");
                break;
            }
            result = client.get_updates(offset, poll_timeout_secs) => {
                match result {
                    Ok(updates) => {
                        backoff = Duration::from_secs(1);
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            dispatch(update, &client, &registry, &feed, &currency);
                        }
                    }
                    Err(e) => {
                        warn!(error = ?e, "getUpdates failed, retrying...");
                        sleep(backoff).await;
                        backoff = (backoff * 2).min(Duration::from_secs(MAX_BACKOFF_SECS));
                    }
                }
            }
        }
    }
}

/// Spawn a handler task for one update. Non-text updates, chatter, and
/// unknown commands are dropped without a reply.
fn dispatch(
    update: Update,
    client: &Arc<TelegramClient>,
    registry: &Arc<AlertRegistry>,
    feed: &Arc<dyn PriceFeed>,
    currency: &str,
) {
    let Some(message) = update.message else {
        return;
    };
    let Some(text) = message.text else {
        return;
    };
    let Some(parsed) = parse(&text) else {
        return;
    };

    let subscriber = Subscriber(message.chat.id);
    let client = Arc::clone(client);
    let registry = Arc::clone(registry);
    let feed = Arc::clone(feed);
    let currency = currency.to_owned();

    tokio::spawn(async move {
        let reply = match parsed {
            Ok(command) => {
                handle_command(command, subscriber, &registry, feed.as_ref(), &currency).await
            }
            Err(invalid) => invalid.reply().to_owned(),
        };
        if let Err(e) = client.send_message(subscriber.0, &reply).await {
            warn!(subscriber = %subscriber, error = ?e, "reply delivery failed");
        }
    });
}

/// Execute a command and produce the reply text.
async fn handle_command(
    command: Command,
    subscriber: Subscriber,
    registry: &AlertRegistry,
    feed: &dyn PriceFeed,
    currency: &str,
) -> String {
    match command {
        Command::Start => WELCOME_TEXT.to_owned(),
        Command::Price { instrument } => match feed.fetch_price(&instrument, currency).await {
            Ok(price) => format!(
                "The current price of {} is ${:.2}.",
                instrument.capitalized(),
                price
            ),
            Err(e) => {
                warn!(instrument = %instrument, error = ?e, "price command fetch failed");
                format!("Unable to fetch price for {}.", instrument)
            }
        },
        Command::Alert {
            instrument,
            target_price,
        } => {
            let reply = format!(
                "Alert set for {} at ${:.2}.",
                instrument.capitalized(),
                target_price
            );
            registry.add_condition(
                subscriber,
                WatchCondition {
                    instrument,
                    target_price,
                },
            );
            reply
        }
    }
}
