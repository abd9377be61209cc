use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::evaluator;
use crate::feed::PriceFeed;
use crate::model::TriggerEvent;
use crate::notifier::Notifier;
use crate::registry::AlertRegistry;

/// User-facing text for a triggered alert.
pub fn alert_message(event: &TriggerEvent) -> String {
    format!(
        "🚨 Alert: {} has reached ${:.2}!",
        event.instrument.capitalized(),
        event.observed_price
    )
}

/// Drive evaluation passes on a fixed period until `cancel` fires.
///
/// At most one pass runs at a time: a tick arriving while the previous
/// pass is still in flight is skipped outright, so a slow feed cannot
/// pile up concurrent fetch storms.
pub async fn run(
    registry: Arc<AlertRegistry>,
    feed: Arc<dyn PriceFeed>,
    notifier: Arc<dyn Notifier>,
    period: Duration,
    currency: String,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // interval() fires immediately; consume that tick so the first pass
    // happens one full period after startup.
    ticker.tick().await;

    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("scheduler cancelled");
                break;
            }
            _ = ticker.tick() => {
                if in_flight.as_ref().is_some_and(|cycle| !cycle.is_finished()) {
                    debug!("previous evaluation still running, skipping tick");
                    continue;
                }
                in_flight = Some(tokio::spawn(run_cycle(
                    Arc::clone(&registry),
                    Arc::clone(&feed),
                    Arc::clone(&notifier),
                    currency.clone(),
                )));
            }
        }
    }

    // Let an in-flight pass finish before returning.
    if let Some(cycle) = in_flight {
        let _ = cycle.await;
    }
}

async fn run_cycle(
    registry: Arc<AlertRegistry>,
    feed: Arc<dyn PriceFeed>,
    notifier: Arc<dyn Notifier>,
    currency: String,
) {
    let events = evaluator::evaluate_once(registry.as_ref(), feed.as_ref(), &currency).await;
    if events.is_empty() {
        return;
    }

    info!(count = events.len(), "alerts triggered");
    for event in &events {
        let message = alert_message(event);
        if let Err(e) = notifier.notify(event.subscriber, &message).await {
            warn!(subscriber = %event.subscriber, error = ?e, "alert delivery failed");
        }
    }
}
