//! Exchange timezone handling.
//!
//! Zone rules come from the IANA database shipped with `chrono-tz`; every
//! value leaving this module is a `time` type carrying the resolved offset.

use std::fmt::{Display, Formatter};

use chrono::{Offset, TimeZone};
use chrono_tz::Tz;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::ValidationError;

/// IANA timezone the exchange keeps its session clock in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeZone(Tz);

impl ExchangeZone {
    pub const NEW_YORK: Self = Self(chrono_tz::America::New_York);

    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        name.trim()
            .parse::<Tz>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidTimezone {
                value: name.to_owned(),
            })
    }

    pub fn name(self) -> &'static str {
        self.0.name()
    }

    /// Converts an instant into exchange wall-clock time.
    pub fn localize(self, instant: OffsetDateTime) -> LocalTime {
        let (offset, abbreviation) = self.offset_at(instant.unix_timestamp());
        LocalTime {
            instant: instant.to_offset(offset),
            abbreviation,
        }
    }

    /// Converts epoch milliseconds into exchange wall-clock time.
    pub fn localize_millis(self, millis: i64) -> Result<LocalTime, ValidationError> {
        let nanos = i128::from(millis) * 1_000_000;
        let instant = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|_| ValidationError::TimestampOutOfRange { millis })?;
        Ok(self.localize(instant))
    }

    /// Attaches the exchange offset in force at a wall-clock time.
    ///
    /// Ambiguous times (the repeated hour when clocks fall back) resolve to
    /// the earlier instant; skipped times are rejected.
    pub fn assume_local(self, local: PrimitiveDateTime) -> Result<OffsetDateTime, ValidationError> {
        let nonexistent = || ValidationError::NonexistentLocalTime {
            value: local.to_string(),
        };

        let naive = chrono::NaiveDate::from_ymd_opt(
            local.year(),
            u32::from(u8::from(local.month())),
            u32::from(local.day()),
        )
        .and_then(|date| {
            date.and_hms_opt(
                u32::from(local.hour()),
                u32::from(local.minute()),
                u32::from(local.second()),
            )
        })
        .ok_or_else(nonexistent)?;

        let resolved = self
            .0
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(nonexistent)?;
        let offset = UtcOffset::from_whole_seconds(resolved.offset().fix().local_minus_utc())
            .map_err(|_| nonexistent())?;

        Ok(local.assume_offset(offset))
    }

    /// Midnight at the start of `date` in the exchange zone.
    pub fn start_of_day(self, date: Date) -> Result<OffsetDateTime, ValidationError> {
        self.assume_local(PrimitiveDateTime::new(date, Time::MIDNIGHT))
    }

    fn offset_at(self, unix_seconds: i64) -> (UtcOffset, String) {
        let Some(utc) = chrono::DateTime::from_timestamp(unix_seconds, 0) else {
            return (UtcOffset::UTC, String::from("UTC"));
        };

        let offset = self.0.offset_from_utc_datetime(&utc.naive_utc());
        let seconds = offset.fix().local_minus_utc();
        let utc_offset = UtcOffset::from_whole_seconds(seconds).unwrap_or(UtcOffset::UTC);
        (utc_offset, offset.to_string())
    }
}

impl Default for ExchangeZone {
    fn default() -> Self {
        Self::NEW_YORK
    }
}

impl Display for ExchangeZone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An instant expressed in exchange wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTime {
    instant: OffsetDateTime,
    abbreviation: String,
}

impl LocalTime {
    pub fn instant(&self) -> OffsetDateTime {
        self.instant
    }

    pub fn date(&self) -> Date {
        self.instant.date()
    }

    pub fn time(&self) -> Time {
        self.instant.time()
    }

    /// Zone abbreviation in force at this instant, e.g. `EST` or `EDT`.
    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    /// `YYYY-MM-DD HH:MM:SS ZZZ`, the persisted `datetime` column format.
    pub fn display(&self) -> String {
        let wall_clock = self
            .instant
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .unwrap_or_else(|_| self.instant.to_string());
        format!("{wall_clock} {}", self.abbreviation)
    }
}
