use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum FeedError {
    #[display("price request failed")]
    Request,
    #[display("failed to parse price response")]
    ResponseParse,
    #[display("no {currency} price for {instrument} in response")]
    MissingPrice {
        instrument: String,
        currency: String,
    },
}

#[derive(Debug, Display, Error)]
pub enum BotError {
    #[display("telegram request failed")]
    Request,
    #[display("failed to parse telegram response")]
    ResponseParse,
    #[display("telegram api error: {description}")]
    Api { description: String },
}
