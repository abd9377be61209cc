use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an instrument in the price feed (e.g. `"bitcoin"`).
///
/// Stored lowercase so it is a stable key into the quote API regardless of
/// how the subscriber typed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instrument(String);

impl Instrument {
    pub fn new(id: &str) -> Self {
        Self(id.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First letter uppercased, for user-facing text ("bitcoin" → "Bitcoin").
    pub fn capitalized(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat id of the subscriber that owns a set of watch conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subscriber(pub i64);

impl fmt::Display for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A one-shot upward price alert: fires once the instrument trades at or
/// above `target_price`, then is removed.
///
/// Duplicates from the same subscriber are legal and tracked independently.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchCondition {
    pub instrument: Instrument,
    pub target_price: f64,
}

/// Produced by an evaluation pass for each condition it removed; consumed
/// once by the notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent {
    pub subscriber: Subscriber,
    pub instrument: Instrument,
    pub observed_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_is_lowercased_on_construction() {
        assert_eq!(Instrument::new("Bitcoin").as_str(), "bitcoin");
        assert_eq!(Instrument::new("ETHEREUM").as_str(), "ethereum");
    }

    #[test]
    fn instrument_capitalized_for_display_text() {
        assert_eq!(Instrument::new("bitcoin").capitalized(), "Bitcoin");
        assert_eq!(Instrument::new("dogecoin").capitalized(), "Dogecoin");
    }

    #[test]
    fn instrument_display_matches_raw_id() {
        assert_eq!(Instrument::new("bitcoin").to_string(), "bitcoin");
    }

    #[test]
    fn identical_conditions_compare_equal() {
        let a = WatchCondition {
            instrument: Instrument::new("bitcoin"),
            target_price: 50_000.0,
        };
        let b = WatchCondition {
            instrument: Instrument::new("bitcoin"),
            target_price: 50_000.0,
        };
        assert_eq!(a, b);
    }

    #[test]
    fn conditions_with_different_targets_are_distinct() {
        let a = WatchCondition {
            instrument: Instrument::new("bitcoin"),
            target_price: 50_000.0,
        };
        let b = WatchCondition {
            instrument: Instrument::new("bitcoin"),
            target_price: 60_000.0,
        };
        assert_ne!(a, b);
    }
}
