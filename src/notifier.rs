pub mod telegram;
pub mod terminal;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::BotError;
use crate::model::Subscriber;

/// Sink for triggered alert notifications.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn Notifier`).
pub trait Notifier: Send + Sync {
    /// Deliver `message` to `subscriber`'s channel.
    fn notify<'a>(
        &'a self,
        subscriber: Subscriber,
        message: &'a str,
    ) -> BoxFuture<'a, Result<(), Report<BotError>>>;
}
