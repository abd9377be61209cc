use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::debug;

use crate::error::FeedError;
use crate::feed::PriceFeed;
use crate::model::Instrument;

/// Quote response body: `{ "<instrument>": { "<currency>": <price> } }`
type PriceResponse = HashMap<String, HashMap<String, f64>>;

pub struct CoinGeckoFeed {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl CoinGeckoFeed {
    /// `requests_per_second` below 1 is clamped to 1.
    pub fn new(base_url: &str, requests_per_second: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN),
        );
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_owned(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }
}

impl PriceFeed for CoinGeckoFeed {
    fn fetch_price<'a>(
        &'a self,
        instrument: &'a Instrument,
        currency: &'a str,
    ) -> BoxFuture<'a, Result<f64, Report<FeedError>>> {
        Box::pin(async move {
            // Wait for rate limiter before making the request
            self.rate_limiter.until_ready().await;

            let params = [("ids", instrument.as_str()), ("vs_currencies", currency)];

            let response = self
                .client
                .get(&self.base_url)
                .query(&params)
                .send()
                .await
                .change_context(FeedError::Request)?;

            if !response.status().is_success() {
                return Err(Report::new(FeedError::Request)
                    .attach(format!("HTTP status: {}", response.status())));
            }

            let body: PriceResponse = response
                .json()
                .await
                .change_context(FeedError::ResponseParse)?;

            let price = extract_price(&body, instrument, currency)?;

            debug!(
                instrument = %instrument,
                currency,
                price,
                "price fetch complete"
            );

            Ok(price)
        })
    }
}

fn extract_price(
    body: &PriceResponse,
    instrument: &Instrument,
    currency: &str,
) -> Result<f64, Report<FeedError>> {
    body.get(instrument.as_str())
        .and_then(|quotes| quotes.get(currency))
        .copied()
        .ok_or_else(|| {
            Report::new(FeedError::MissingPrice {
                instrument: instrument.to_string(),
                currency: currency.to_owned(),
            })
        })
}
