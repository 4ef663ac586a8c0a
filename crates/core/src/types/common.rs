//! Time values and the validation trait shared by the records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock instant in milliseconds since the Unix epoch
///
/// Serialized as a bare number so stored records stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// A clock set before 1970 reads as the epoch
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as i64);
        Self(millis)
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Time from `self` until `later`; zero when `later` is not after it
    pub fn until(self, later: Timestamp) -> std::time::Duration {
        let millis = later.0.saturating_sub(self.0).max(0) as u64;
        std::time::Duration::from_millis(millis)
    }
}

/// A span of audio in whole seconds, shown as `h:mm:ss`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListeningTime(u64);

impl ListeningTime {
    /// Fractions are dropped; negative and non-finite input reads as zero
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            Self(seconds as u64)
        } else {
            Self(0)
        }
    }

    pub const fn as_seconds(self) -> u64 {
        self.0
    }

    /// Hours and minutes only, e.g. `11h 4m` for a library listing
    pub fn compact(self) -> String {
        let (hours, minutes) = (self.0 / 3600, self.0 % 3600 / 60);
        if hours > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}m", minutes)
        }
    }
}

impl fmt::Display for ListeningTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, minutes, seconds) = (self.0 / 3600, self.0 % 3600 / 60, self.0 % 60);
        write!(f, "{}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Trait for types that can validate themselves
pub trait Validator {
    /// Validates the instance and returns errors if invalid
    fn validate(&self) -> Result<(), Vec<String>>;

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_serializes_as_plain_number() {
        let json = serde_json::to_string(&Timestamp::from_millis(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_until_never_goes_negative() {
        let played = Timestamp::from_millis(10_000);
        let later = Timestamp::from_millis(70_500);

        assert_eq!(played.until(later).as_millis(), 60_500);
        assert_eq!(later.until(played), std::time::Duration::ZERO);
    }

    #[test]
    fn test_listening_time_display() {
        assert_eq!(ListeningTime::from_seconds(3723.9).to_string(), "1:02:03");
        assert_eq!(ListeningTime::from_seconds(59.0).to_string(), "0:00:59");
        assert_eq!(ListeningTime::from_seconds(-4.0), ListeningTime::default());
        assert_eq!(ListeningTime::from_seconds(f64::INFINITY).as_seconds(), 0);
    }

    #[test]
    fn test_listening_time_compact() {
        assert_eq!(ListeningTime::from_seconds(11.0 * 3600.0 + 245.0).compact(), "11h 4m");
        assert_eq!(ListeningTime::from_seconds(120.0).compact(), "2m");
    }

    #[test]
    fn test_validator_default_is_valid() {
        struct Rate(f32);

        impl Validator for Rate {
            fn validate(&self) -> Result<(), Vec<String>> {
                if self.0 > 0.0 {
                    Ok(())
                } else {
                    Err(vec!["rate must be positive".to_string()])
                }
            }
        }

        assert!(Rate(1.25).is_valid());
        assert!(!Rate(0.0).is_valid());
    }
}
