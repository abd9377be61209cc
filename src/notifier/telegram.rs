use std::sync::Arc;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::BotError;
use crate::model::Subscriber;
use crate::notifier::Notifier;
use crate::telegram::TelegramClient;

/// Delivers alerts to the subscriber's chat via `sendMessage`.
pub struct TelegramNotifier {
    client: Arc<TelegramClient>,
}

impl TelegramNotifier {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

impl Notifier for TelegramNotifier {
    fn notify<'a>(
        &'a self,
        subscriber: Subscriber,
        message: &'a str,
    ) -> BoxFuture<'a, Result<(), Report<BotError>>> {
        Box::pin(async move { self.client.send_message(subscriber.0, message).await })
    }
}
