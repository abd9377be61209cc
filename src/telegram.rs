use error_stack::{Report, ResultExt};
use serde::Deserialize;
use serde_json::json;

use crate::error::BotError;

const TELEGRAM_BASE_URL: &str = "https://api.telegram.org";

/// Minimal Telegram Bot API client covering the two methods the bot needs:
/// `getUpdates` long-polling and `sendMessage`.
pub struct TelegramClient {
    client: reqwest::Client,
    /// `<base>/bot<token>`, method name appended per call.
    bot_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self::with_base_url(TELEGRAM_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_url: format!("{}/bot{}", base_url, token),
        }
    }

    /// Long-poll for updates after `offset`. Blocks server-side for up to
    /// `timeout_secs` when no updates are pending.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, Report<BotError>> {
        let url = format!("{}/getUpdates", self.bot_url);
        let params = [
            ("offset", offset.to_string()),
            ("timeout", timeout_secs.to_string()),
        ];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .change_context(BotError::Request)?;

        if !response.status().is_success() {
            return Err(Report::new(BotError::Request)
                .attach(format!("HTTP status: {}", response.status())));
        }

        let body: ApiResponse<Vec<Update>> = response
            .json()
            .await
            .change_context(BotError::ResponseParse)?;

        body.into_result()
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), Report<BotError>> {
        let url = format!("{}/sendMessage", self.bot_url);
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .change_context(BotError::Request)?;

        if !response.status().is_success() {
            return Err(Report::new(BotError::Request)
                .attach(format!("HTTP status: {}", response.status())));
        }

        let body: ApiResponse<Message> = response
            .json()
            .await
            .change_context(BotError::ResponseParse)?;

        body.into_result().map(|_| ())
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

/// Envelope every Bot API method responds with:
/// `{ "ok": true, "result": ... }` or `{ "ok": false, "description": "..." }`
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, Report<BotError>> {
        if !self.ok {
            return Err(Report::new(BotError::Api {
                description: self
                    .description
                    .unwrap_or_else(|| "no description".into()),
            }));
        }
        self.result.ok_or_else(|| {
            Report::new(BotError::ResponseParse).attach("ok response without result field")
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}
