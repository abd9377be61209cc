pub mod coingecko;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::FeedError;
use crate::model::Instrument;

/// Abstraction over an external price-quote source.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn PriceFeed`).
pub trait PriceFeed: Send + Sync {
    /// Fetch the most recent quoted price for `instrument` in `currency`.
    ///
    /// Returns the quoted price, or an error for every failure mode
    /// (transport error, non-2xx status, instrument or currency missing
    /// from the response body). A returned price is never a stale
    /// fallback; callers treat an error as "skip this instrument for the
    /// current cycle".
    ///
    /// Each call is a fresh request. Callers wanting to bound outbound
    /// traffic must deduplicate by instrument before calling.
    fn fetch_price<'a>(
        &'a self,
        instrument: &'a Instrument,
        currency: &'a str,
    ) -> BoxFuture<'a, Result<f64, Report<FeedError>>>;
}
