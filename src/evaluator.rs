use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::feed::PriceFeed;
use crate::model::{Instrument, TriggerEvent};
use crate::registry::AlertRegistry;

/// Run one alert evaluation pass.
///
/// Takes a snapshot of the registry, fetches each distinct instrument from
/// the feed exactly once, then removes every satisfied condition from the
/// live registry. A `TriggerEvent` is emitted only when the removal took
/// the condition out, so each condition instance fires at most once even
/// if another path removed it mid-pass.
///
/// A failed fetch leaves that instrument's conditions untouched for the
/// next cycle; other instruments in the same pass are unaffected.
pub async fn evaluate_once(
    registry: &AlertRegistry,
    feed: &dyn PriceFeed,
    currency: &str,
) -> Vec<TriggerEvent> {
    let snapshot = registry.snapshot();
    if snapshot.is_empty() {
        return Vec::new();
    }

    let instruments: HashSet<&Instrument> = snapshot
        .values()
        .flatten()
        .map(|condition| &condition.instrument)
        .collect();

    let mut prices: HashMap<Instrument, f64> = HashMap::new();
    for instrument in instruments {
        match feed.fetch_price(instrument, currency).await {
            Ok(price) => {
                prices.insert(instrument.clone(), price);
            }
            Err(e) => {
                warn!(
                    instrument = %instrument,
                    error = ?e,
                    "price fetch failed, skipping instrument this cycle"
                );
            }
        }
    }

    let mut events = Vec::new();
    for (subscriber, conditions) in snapshot {
        for condition in conditions {
            let Some(&observed) = prices.get(&condition.instrument) else {
                continue;
            };
            if observed < condition.target_price {
                continue;
            }
            if registry.remove_condition(subscriber, &condition) {
                events.push(TriggerEvent {
                    subscriber,
                    instrument: condition.instrument,
                    observed_price: observed,
                });
            }
        }
    }

    debug!(triggered = events.len(), "evaluation pass complete");
    events
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use error_stack::Report;
    use futures::future::BoxFuture;

    use super::*;
    use crate::error::FeedError;
    use crate::model::{Subscriber, WatchCondition};

    /// Feed backed by a mutable price table; records every fetch and fails
    /// for instruments absent from the table.
    struct MockFeed {
        prices: Mutex<HashMap<String, f64>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockFeed {
        fn new(prices: &[(&str, f64)]) -> Self {
            Self {
                prices: Mutex::new(
                    prices
                        .iter()
                        .map(|(id, price)| (id.to_string(), *price))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn set_price(&self, instrument: &str, price: f64) {
            self.prices
                .lock()
                .unwrap()
                .insert(instrument.to_owned(), price);
        }

        fn calls_for(&self, instrument: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.as_str() == instrument)
                .count()
        }
    }

    impl PriceFeed for MockFeed {
        fn fetch_price<'a>(
            &'a self,
            instrument: &'a Instrument,
            currency: &'a str,
        ) -> BoxFuture<'a, Result<f64, Report<FeedError>>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(instrument.to_string());
                self.prices
                    .lock()
                    .unwrap()
                    .get(instrument.as_str())
                    .copied()
                    .ok_or_else(|| {
                        Report::new(FeedError::MissingPrice {
                            instrument: instrument.to_string(),
                            currency: currency.to_owned(),
                        })
                    })
            })
        }
    }

    fn condition(instrument: &str, target: f64) -> WatchCondition {
        WatchCondition {
            instrument: Instrument::new(instrument),
            target_price: target,
        }
    }

    #[tokio::test]
    async fn empty_registry_fetches_nothing() {
        let registry = AlertRegistry::new();
        let feed = MockFeed::new(&[("bitcoin", 50_000.0)]);

        let events = evaluate_once(&registry, &feed, "usd").await;

        assert!(events.is_empty());
        assert_eq!(feed.calls_for("bitcoin"), 0);
    }

    #[tokio::test]
    async fn price_below_target_leaves_condition_pending() {
        let registry = AlertRegistry::new();
        registry.add_condition(Subscriber(1), condition("bitcoin", 50_000.0));
        let feed = MockFeed::new(&[("bitcoin", 49_000.0)]);

        let events = evaluate_once(&registry, &feed, "usd").await;

        assert!(events.is_empty());
        assert_eq!(registry.snapshot()[&Subscriber(1)].len(), 1);
    }

    #[tokio::test]
    async fn price_at_target_triggers_and_removes() {
        let registry = AlertRegistry::new();
        registry.add_condition(Subscriber(1), condition("bitcoin", 50_000.0));
        let feed = MockFeed::new(&[("bitcoin", 50_000.0)]);

        let events = evaluate_once(&registry, &feed, "usd").await;

        assert_eq!(
            events,
            vec![TriggerEvent {
                subscriber: Subscriber(1),
                instrument: Instrument::new("bitcoin"),
                observed_price: 50_000.0,
            }]
        );
        assert!(registry.snapshot().is_empty());
    }

    #[tokio::test]
    async fn condition_fires_exactly_once_across_cycles() {
        let registry = AlertRegistry::new();
        registry.add_condition(Subscriber(1), condition("bitcoin", 50_000.0));
        let feed = MockFeed::new(&[("bitcoin", 49_000.0)]);

        let first = evaluate_once(&registry, &feed, "usd").await;
        assert!(first.is_empty());
        assert_eq!(registry.snapshot()[&Subscriber(1)].len(), 1);

        feed.set_price("bitcoin", 50_500.0);
        let second = evaluate_once(&registry, &feed, "usd").await;
        assert_eq!(
            second,
            vec![TriggerEvent {
                subscriber: Subscriber(1),
                instrument: Instrument::new("bitcoin"),
                observed_price: 50_500.0,
            }]
        );
        assert!(registry.snapshot().is_empty());

        // Nothing left to fire
        let third = evaluate_once(&registry, &feed, "usd").await;
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn duplicate_conditions_each_fire_once() {
        let registry = AlertRegistry::new();
        registry.add_condition(Subscriber(1), condition("bitcoin", 50_000.0));
        registry.add_condition(Subscriber(1), condition("bitcoin", 50_000.0));
        let feed = MockFeed::new(&[("bitcoin", 51_000.0)]);

        let events = evaluate_once(&registry, &feed, "usd").await;

        assert_eq!(events.len(), 2);
        assert!(registry.snapshot().is_empty());
    }

    #[tokio::test]
    async fn shared_instrument_fetched_once_per_pass() {
        let registry = AlertRegistry::new();
        registry.add_condition(Subscriber(1), condition("ethereum", 3_000.0));
        registry.add_condition(Subscriber(2), condition("ethereum", 4_000.0));
        registry.add_condition(Subscriber(2), condition("ethereum", 5_000.0));
        let feed = MockFeed::new(&[("ethereum", 3_500.0)]);

        let events = evaluate_once(&registry, &feed, "usd").await;

        assert_eq!(feed.calls_for("ethereum"), 1);
        // Only the subscriber whose threshold is met fires
        assert_eq!(
            events,
            vec![TriggerEvent {
                subscriber: Subscriber(1),
                instrument: Instrument::new("ethereum"),
                observed_price: 3_500.0,
            }]
        );
        assert_eq!(registry.snapshot()[&Subscriber(2)].len(), 2);
    }

    #[tokio::test]
    async fn feed_failure_is_isolated_per_instrument() {
        let registry = AlertRegistry::new();
        registry.add_condition(Subscriber(1), condition("bitcoin", 50_000.0));
        registry.add_condition(Subscriber(1), condition("ethereum", 3_000.0));
        // No bitcoin entry: its fetch fails this cycle
        let feed = MockFeed::new(&[("ethereum", 3_500.0)]);

        let events = evaluate_once(&registry, &feed, "usd").await;

        assert_eq!(
            events,
            vec![TriggerEvent {
                subscriber: Subscriber(1),
                instrument: Instrument::new("ethereum"),
                observed_price: 3_500.0,
            }]
        );
        // The unevaluable condition survives for the next cycle
        assert_eq!(
            registry.snapshot()[&Subscriber(1)],
            vec![condition("bitcoin", 50_000.0)]
        );
    }

    /// Feed that yanks a condition out of the registry while the fetch is
    /// in flight, landing in the window between snapshot and removal.
    struct RemovingFeed {
        registry: std::sync::Arc<AlertRegistry>,
        victim: (Subscriber, WatchCondition),
        price: f64,
    }

    impl PriceFeed for RemovingFeed {
        fn fetch_price<'a>(
            &'a self,
            _instrument: &'a Instrument,
            _currency: &'a str,
        ) -> BoxFuture<'a, Result<f64, Report<FeedError>>> {
            Box::pin(async move {
                let (subscriber, condition) = &self.victim;
                self.registry.remove_condition(*subscriber, condition);
                Ok(self.price)
            })
        }
    }

    #[tokio::test]
    async fn condition_removed_mid_pass_produces_no_event() {
        let registry = std::sync::Arc::new(AlertRegistry::new());
        registry.add_condition(Subscriber(1), condition("bitcoin", 50_000.0));
        let feed = RemovingFeed {
            registry: std::sync::Arc::clone(&registry),
            victim: (Subscriber(1), condition("bitcoin", 50_000.0)),
            price: 51_000.0,
        };

        // The snapshot still holds the condition and the price satisfies
        // it, but the removal already happened elsewhere: no phantom event.
        let events = evaluate_once(&registry, &feed, "usd").await;
        assert!(events.is_empty());
        assert!(registry.snapshot().is_empty());
    }
}
