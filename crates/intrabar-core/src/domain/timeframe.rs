use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Bar granularity labels used for file layout and aggregation.
///
/// Variants are declared finest first, so the derived ordering compares
/// granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "10m")]
    TenMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl Timeframe {
    pub const ALL: [Self; 8] = [
        Self::OneMinute,
        Self::ThreeMinutes,
        Self::FiveMinutes,
        Self::TenMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::OneDay,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::ThreeMinutes => "3m",
            Self::FiveMinutes => "5m",
            Self::TenMinutes => "10m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
        }
    }

    /// Canonical bar length in minutes.
    pub const fn minutes(self) -> u32 {
        match self {
            Self::OneMinute => 1,
            Self::ThreeMinutes => 3,
            Self::FiveMinutes => 5,
            Self::TenMinutes => 10,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::OneHour => 60,
            Self::OneDay => 1_440,
        }
    }
}

impl Display for Timeframe {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|timeframe| timeframe.as_str() == normalized)
            .ok_or(ValidationError::InvalidTimeframe {
                value: value.trim().to_owned(),
            })
    }
}

/// Minute granularity the price history endpoint can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Frequency(u32);

impl Frequency {
    pub const SUPPORTED_MINUTES: [u32; 5] = [1, 5, 10, 15, 30];

    pub const ONE_MINUTE: Self = Self(1);
    pub const FIVE_MINUTES: Self = Self(5);

    pub const fn minutes(self) -> u32 {
        self.0
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.0)
    }
}

impl TryFrom<u32> for Frequency {
    type Error = ValidationError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        if Self::SUPPORTED_MINUTES.contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(ValidationError::UnsupportedFrequency { minutes })
        }
    }
}

impl TryFrom<Timeframe> for Frequency {
    type Error = ValidationError;

    fn try_from(timeframe: Timeframe) -> Result<Self, Self::Error> {
        Self::try_from(timeframe.minutes())
    }
}

impl From<Frequency> for u32 {
    fn from(value: Frequency) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_label() {
        for timeframe in Timeframe::ALL {
            assert_eq!(Timeframe::from_str(timeframe.as_str()), Ok(timeframe));
        }
        assert_eq!(Timeframe::from_str(" 1H "), Ok(Timeframe::OneHour));
    }

    #[test]
    fn rejects_unknown_label_instead_of_guessing() {
        let err = Timeframe::from_str("2h").expect_err("must fail");
        assert_eq!(
            err,
            ValidationError::InvalidTimeframe {
                value: String::from("2h")
            }
        );
    }

    #[test]
    fn ordering_follows_granularity() {
        assert!(Timeframe::OneMinute < Timeframe::ThreeMinutes);
        assert!(Timeframe::ThirtyMinutes < Timeframe::OneHour);
        assert_eq!(Timeframe::OneDay.minutes(), 1_440);
    }

    #[test]
    fn frequency_accepts_only_provider_minutes() {
        assert_eq!(Frequency::try_from(15).map(Frequency::minutes), Ok(15));
        assert_eq!(
            Frequency::try_from(3),
            Err(ValidationError::UnsupportedFrequency { minutes: 3 })
        );
        assert!(Frequency::try_from(Timeframe::OneHour).is_err());
        assert_eq!(
            Frequency::try_from(Timeframe::FiveMinutes),
            Ok(Frequency::FIVE_MINUTES)
        );
    }
}
