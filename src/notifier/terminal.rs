use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::BotError;
use crate::model::Subscriber;
use crate::notifier::Notifier;

/// Logs triggered alerts instead of messaging the subscriber. Used for dry
/// runs where the bot answers commands but deliveries stay local.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify<'a>(
        &'a self,
        subscriber: Subscriber,
        message: &'a str,
    ) -> BoxFuture<'a, Result<(), Report<BotError>>> {
        Box::pin(async move {
            tracing::warn!(subscriber = %subscriber, "ALERT: {}", message);
            Ok(())
        })
    }
}
