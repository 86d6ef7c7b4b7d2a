//! Value objects shared by listings, requests and reviews.
//!
//! - Closed vocabularies persisted as TEXT: [`TimeSlot`], [`DeliveryMethod`],
//!   [`FishCondition`]. Their literals are the durable format.
//! - [`PreferredSize`]: optional "600" / "600-800" size preference.
//! - [`Stars`]: review rating, constructible only for 1..=5.
//! - [`estimated_delivery_fee`]: read-side fee estimate from a distance.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Flat delivery rate applied per kilometer of farm-to-restaurant distance.
pub const DELIVERY_RATE_PER_KM: f64 = 2.5;

/// Fee estimate for a known distance. Never persisted.
pub fn estimated_delivery_fee(distance_km: f64) -> f64 {
    distance_km * DELIVERY_RATE_PER_KM
}

/// Text outside one of the closed vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVocabulary {
    /// Which vocabulary was being parsed.
    pub kind: &'static str,
    /// The rejected text.
    pub value: String,
}

// Shared plumbing for the three TEXT vocabularies: literal table, Display, FromStr.
macro_rules! text_vocabulary {
    ($ty:ident, $kind:literal, { $($variant:ident => $lit:literal),+ $(,)? }) => {
        impl $ty {
            /// Every value, in display order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Storage/display literal.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $lit),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVocabulary;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($lit => Ok($ty::$variant),)+
                    _ => Err(UnknownVocabulary { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

/// Delivery time slot offered by a listing and chosen by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    /// Same day, morning.
    TodayMorning,
    /// Same day, evening.
    TodayEvening,
    /// Next day, morning.
    NextDayMorning,
    /// Next day, evening.
    NextDayEvening,
}

text_vocabulary!(TimeSlot, "time slot", {
    TodayMorning => "Today Morning",
    TodayEvening => "Today Evening",
    NextDayMorning => "Next-day Morning",
    NextDayEvening => "Next-day Evening",
});

const MORNING_WINDOWS: &[&str] = &["7–8", "8–9", "Any morning"];
const EVENING_WINDOWS: &[&str] = &["15–16", "16–17", "Any evening"];

impl TimeSlot {
    /// Morning slot, today or next day.
    pub const fn is_morning(self) -> bool {
        matches!(self, TimeSlot::TodayMorning | TimeSlot::NextDayMorning)
    }

    /// Same-day slot.
    pub const fn is_today(self) -> bool {
        matches!(self, TimeSlot::TodayMorning | TimeSlot::TodayEvening)
    }

    /// Preferred hand-over windows a restaurant may pick within this slot.
    pub const fn preferred_windows(self) -> &'static [&'static str] {
        if self.is_morning() {
            MORNING_WINDOWS
        } else {
            EVENING_WINDOWS
        }
    }

    /// "Any morning" / "Any evening".
    pub const fn default_window(self) -> &'static str {
        if self.is_morning() {
            "Any morning"
        } else {
            "Any evening"
        }
    }
}

/// How the fish reaches the restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryMethod {
    /// Farm delivers.
    Delivery,
    /// Restaurant collects.
    Pickup,
}

text_vocabulary!(DeliveryMethod, "delivery method", {
    Delivery => "Delivery",
    Pickup => "Pickup",
});

/// Condition the fish is handed over in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FishCondition {
    /// Alive.
    Live,
    /// Fresh, on ice.
    Chilled,
    /// Fresh, frozen.
    Frozen,
}

text_vocabulary!(FishCondition, "fish condition", {
    Live => "Live",
    Chilled => "Chilled",
    Frozen => "Frozen",
});

impl FishCondition {
    /// Chilled and Frozen are both covered by a listing's "fresh" flag.
    pub const fn is_fresh(self) -> bool {
        matches!(self, FishCondition::Chilled | FishCondition::Frozen)
    }
}

/// Rejected preferred-size text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("preferred size must be a positive number or a range like 600-800, got {0:?}")]
pub struct InvalidPreferredSize(pub String);

/// Size preference attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PreferredSize {
    /// A single target size.
    Exact(f64),
    /// An inclusive range with `low < high`.
    Range {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
}

impl PreferredSize {
    /// Parse optional form input; blank means no preference.
    pub fn parse_optional(text: &str) -> Result<Option<Self>, InvalidPreferredSize> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

// Digits with an optional fractional part. No sign, no exponent.
fn parse_plain_decimal(s: &str) -> Option<f64> {
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int) || frac.is_some_and(|f| !all_digits(f)) {
        return None;
    }
    s.parse().ok().filter(|v: &f64| v.is_finite())
}

impl FromStr for PreferredSize {
    type Err = InvalidPreferredSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidPreferredSize(s.to_string());
        match s.split_once('-') {
            None => {
                let value = parse_plain_decimal(s).ok_or_else(invalid)?;
                if value > 0.0 {
                    Ok(PreferredSize::Exact(value))
                } else {
                    Err(invalid())
                }
            }
            Some((low, high)) => {
                let low = parse_plain_decimal(low).ok_or_else(invalid)?;
                let high = parse_plain_decimal(high).ok_or_else(invalid)?;
                if low > 0.0 && high > 0.0 && low < high {
                    Ok(PreferredSize::Range { low, high })
                } else {
                    Err(invalid())
                }
            }
        }
    }
}

impl fmt::Display for PreferredSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferredSize::Exact(value) => write!(f, "{value}"),
            PreferredSize::Range { low, high } => write!(f, "{low}-{high}"),
        }
    }
}

/// Star rating outside 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("stars must be between 1 and 5, got {0}")]
pub struct InvalidStars(pub i32);

/// Review rating in 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Stars(u8);

impl Stars {
    /// Star count, 1..=5.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for Stars {
    type Error = InvalidStars;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1..=5 => Ok(Stars(value as u8)),
            _ => Err(InvalidStars(value)),
        }
    }
}

impl From<Stars> for i32 {
    fn from(stars: Stars) -> Self {
        i32::from(stars.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_fee_uses_rate() {
        assert_eq!(estimated_delivery_fee(12.0), 12.0 * DELIVERY_RATE_PER_KM);
        assert_eq!(estimated_delivery_fee(0.0), 0.0);
    }

    #[test]
    fn vocabularies_round_trip_their_literals() {
        for slot in TimeSlot::ALL {
            assert_eq!(slot.as_str().parse::<TimeSlot>().unwrap(), *slot);
        }
        for method in DeliveryMethod::ALL {
            assert_eq!(method.to_string().parse::<DeliveryMethod>().unwrap(), *method);
        }
        for condition in FishCondition::ALL {
            assert_eq!(condition.as_str().parse::<FishCondition>().unwrap(), *condition);
        }
        let err = "Next day Morning".parse::<TimeSlot>().unwrap_err();
        assert_eq!(err.kind, "time slot");
    }

    #[test]
    fn windows_follow_slot_half_of_day() {
        assert_eq!(TimeSlot::NextDayMorning.default_window(), "Any morning");
        assert_eq!(TimeSlot::TodayEvening.default_window(), "Any evening");
        assert!(TimeSlot::TodayMorning.preferred_windows().contains(&"8–9"));
        assert!(TimeSlot::NextDayEvening.preferred_windows().contains(&"16–17"));
        assert!(TimeSlot::TodayEvening.is_today());
        assert!(!TimeSlot::NextDayEvening.is_today());
    }

    #[test]
    fn preferred_size_accepts_numbers_and_ranges() {
        assert_eq!("600".parse::<PreferredSize>(), Ok(PreferredSize::Exact(600.0)));
        assert_eq!("1.5".parse::<PreferredSize>(), Ok(PreferredSize::Exact(1.5)));
        assert_eq!(
            "600-800".parse::<PreferredSize>(),
            Ok(PreferredSize::Range { low: 600.0, high: 800.0 })
        );
        assert_eq!(PreferredSize::parse_optional("  "), Ok(None));
        assert_eq!(
            PreferredSize::parse_optional(" 600-800 "),
            Ok(Some(PreferredSize::Range { low: 600.0, high: 800.0 }))
        );
    }

    #[test]
    fn preferred_size_rejects_bad_input() {
        for bad in ["0", "-5", "800-600", "600-600", "0-5", "abc", "6e2", "600-", ".5", "1-2-3"] {
            assert!(bad.parse::<PreferredSize>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn preferred_size_rejects_overflowing_digits() {
        let huge = "9".repeat(400);
        assert!(huge.parse::<PreferredSize>().is_err());
        assert!(format!("1-{huge}").parse::<PreferredSize>().is_err());
        assert!(PreferredSize::parse_optional(&huge).is_err());
    }

    #[test]
    fn preferred_size_display_matches_input() {
        for text in ["600", "600-800", "1.5-2.25"] {
            assert_eq!(text.parse::<PreferredSize>().unwrap().to_string(), text);
        }
    }

    #[test]
    fn stars_bounds() {
        assert!(Stars::try_from(0).is_err());
        assert!(Stars::try_from(6).is_err());
        assert_eq!(Stars::try_from(1).unwrap().get(), 1);
        assert_eq!(i32::from(Stars::try_from(5).unwrap()), 5);
    }
}
