//! Regular-session calendar.
//!
//! A timestamp is regular-session time when its exchange wall-clock time is
//! in `[open, close)`. Early-close days come from a table of
//! [`EarlyClose`] entries, so adding an exception never touches the filter.

use time::macros::{format_description, time};
use time::{Date, Month, OffsetDateTime, Time, Weekday};

use crate::config::MarketConfig;
use crate::domain::ExchangeZone;
use crate::ValidationError;

/// Calendar predicate selecting the days an override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRule {
    /// Same month and day every year, whatever the weekday.
    FixedDate { month: Month, day: u8 },
    /// The `nth` (1-based) occurrence of `weekday` in `month`.
    NthWeekday {
        month: Month,
        weekday: Weekday,
        nth: usize,
    },
}

impl DateRule {
    pub fn matches(self, date: Date) -> bool {
        match self {
            Self::FixedDate { month, day } => date.month() == month && date.day() == day,
            Self::NthWeekday {
                month,
                weekday,
                nth,
            } => {
                date.month() == month
                    && nth_weekday_of_month(date.year(), month, weekday, nth) == Some(date.day())
            }
        }
    }
}

/// Day-of-month of the `nth` `weekday` in a month, found by scanning every
/// day of the month. `None` when the month has fewer occurrences.
pub fn nth_weekday_of_month(year: i32, month: Month, weekday: Weekday, nth: usize) -> Option<u8> {
    let index = nth.checked_sub(1)?;
    (1..=month.length(year))
        .filter(|&day| {
            Date::from_calendar_date(year, month, day).is_ok_and(|date| date.weekday() == weekday)
        })
        .nth(index)
}

/// A shortened session: on matching days, times after `close` are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarlyClose {
    pub name: String,
    pub rule: DateRule,
    /// Last accepted wall-clock time (inclusive).
    pub close: Time,
}

impl EarlyClose {
    pub fn new(name: impl Into<String>, rule: DateRule, close: Time) -> Self {
        Self {
            name: name.into(),
            rule,
            close,
        }
    }
}

/// US equity early closes: July 3rd, the fourth Friday of November and
/// December 24th.
pub fn us_equity_early_closes(close: Time) -> Vec<EarlyClose> {
    vec![
        EarlyClose::new(
            "independence_day_eve",
            DateRule::FixedDate {
                month: Month::July,
                day: 3,
            },
            close,
        ),
        EarlyClose::new(
            "fourth_friday_of_november",
            DateRule::NthWeekday {
                month: Month::November,
                weekday: Weekday::Friday,
                nth: 4,
            },
            close,
        ),
        EarlyClose::new(
            "christmas_eve",
            DateRule::FixedDate {
                month: Month::December,
                day: 24,
            },
            close,
        ),
    ]
}

/// Regular trading session of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketCalendar {
    zone: ExchangeZone,
    open: Time,
    close: Time,
    early_closes: Vec<EarlyClose>,
}

impl Default for MarketCalendar {
    fn default() -> Self {
        Self::new(
            ExchangeZone::NEW_YORK,
            time!(09:30:00),
            time!(16:00:00),
            us_equity_early_closes(time!(13:00:00)),
        )
    }
}

impl MarketCalendar {
    pub fn new(zone: ExchangeZone, open: Time, close: Time, early_closes: Vec<EarlyClose>) -> Self {
        Self {
            zone,
            open,
            close,
            early_closes,
        }
    }

    pub fn from_config(config: &MarketConfig) -> Result<Self, ValidationError> {
        let zone = ExchangeZone::parse(&config.timezone)?;
        let open = parse_session_time(&config.market_open)?;
        let close = parse_session_time(&config.market_close)?;
        let early_close = parse_session_time(&config.early_close)?;
        Ok(Self::new(zone, open, close, us_equity_early_closes(early_close)))
    }

    pub fn with_early_close(mut self, early_close: EarlyClose) -> Self {
        self.early_closes.push(early_close);
        self
    }

    pub fn zone(&self) -> ExchangeZone {
        self.zone
    }

    pub fn early_closes(&self) -> &[EarlyClose] {
        &self.early_closes
    }

    /// Whether `instant` falls inside the regular session.
    pub fn is_regular_session(&self, instant: OffsetDateTime) -> bool {
        let local = self.zone.localize(instant);
        self.is_session_time(local.date(), local.time())
    }

    /// Session check on exchange wall-clock date and time.
    pub fn is_session_time(&self, date: Date, time: Time) -> bool {
        if time < self.open || time >= self.close {
            return false;
        }

        !self
            .early_closes
            .iter()
            .any(|early| early.rule.matches(date) && time > early.close)
    }
}

fn parse_session_time(value: &str) -> Result<Time, ValidationError> {
    Time::parse(value.trim(), format_description!("[hour]:[minute]:[second]")).map_err(|_| {
        ValidationError::InvalidSessionTime {
            value: value.to_owned(),
        }
    })
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};
    use time::PrimitiveDateTime;

    use super::*;

    fn at(local: PrimitiveDateTime) -> OffsetDateTime {
        ExchangeZone::NEW_YORK
            .assume_local(local)
            .expect("valid New York wall-clock time")
    }

    #[test]
    fn open_is_inclusive_and_close_exclusive() {
        let calendar = MarketCalendar::default();

        assert!(!calendar.is_regular_session(at(datetime!(2025-01-02 09:29:59))));
        assert!(calendar.is_regular_session(at(datetime!(2025-01-02 09:30:00))));
        assert!(calendar.is_regular_session(at(datetime!(2025-01-02 15:59:59))));
        assert!(!calendar.is_regular_session(at(datetime!(2025-01-02 16:00:00))));
    }

    #[test]
    fn session_is_evaluated_in_exchange_time_not_utc() {
        let calendar = MarketCalendar::default();

        // 14:30 UTC is 09:30 EST in winter but 10:30 EDT in summer.
        assert!(calendar.is_regular_session(datetime!(2025-01-02 14:30:00 UTC)));
        assert!(!calendar.is_regular_session(datetime!(2025-01-02 14:29:00 UTC)));
        assert!(calendar.is_regular_session(datetime!(2025-06-02 13:30:00 UTC)));
        assert!(!calendar.is_regular_session(datetime!(2025-06-02 20:00:00 UTC)));
    }

    #[test]
    fn july_third_closes_at_one() {
        let calendar = MarketCalendar::default();

        assert!(calendar.is_regular_session(at(datetime!(2025-07-03 13:00:00))));
        assert!(!calendar.is_regular_session(at(datetime!(2025-07-03 13:00:01))));
        assert!(calendar.is_regular_session(at(datetime!(2025-07-02 15:00:00))));
    }

    #[test]
    fn fourth_friday_of_november_closes_at_one() {
        let calendar = MarketCalendar::default();

        // November 2025 Fridays: 7, 14, 21, 28.
        assert!(calendar.is_regular_session(at(datetime!(2025-11-28 13:00:00))));
        assert!(!calendar.is_regular_session(at(datetime!(2025-11-28 13:00:01))));
        assert!(calendar.is_regular_session(at(datetime!(2025-11-21 14:00:00))));
    }

    #[test]
    fn christmas_eve_rule_ignores_weekday() {
        let calendar = MarketCalendar::default();

        // December 24, 2025 is a Wednesday.
        assert_eq!(date!(2025 - 12 - 24).weekday(), Weekday::Wednesday);
        assert!(calendar.is_regular_session(at(datetime!(2025-12-24 12:59:00))));
        assert!(!calendar.is_regular_session(at(datetime!(2025-12-24 13:30:00))));
        assert!(calendar.is_regular_session(at(datetime!(2025-12-23 13:30:00))));
    }

    #[test]
    fn finds_fourth_friday_by_scanning_month() {
        assert_eq!(
            nth_weekday_of_month(2025, Month::November, Weekday::Friday, 4),
            Some(28)
        );
        // November 1, 2024 is a Friday, so the fourth Friday is the 22nd.
        assert_eq!(
            nth_weekday_of_month(2024, Month::November, Weekday::Friday, 4),
            Some(22)
        );
        // February 2021 has exactly four Fridays.
        assert_eq!(
            nth_weekday_of_month(2021, Month::February, Weekday::Friday, 5),
            None
        );
        assert_eq!(
            nth_weekday_of_month(2021, Month::February, Weekday::Friday, 0),
            None
        );
    }

    #[test]
    fn extra_early_close_extends_the_table() {
        let calendar = MarketCalendar::default().with_early_close(EarlyClose::new(
            "black_friday_2024",
            DateRule::FixedDate {
                month: Month::November,
                day: 29,
            },
            time!(13:00:00),
        ));

        assert_eq!(calendar.early_closes().len(), 4);
        assert!(!calendar.is_regular_session(at(datetime!(2024-11-29 14:00:00))));
    }

    #[test]
    fn builds_from_config_and_rejects_bad_times() {
        let calendar =
            MarketCalendar::from_config(&MarketConfig::default()).expect("defaults are valid");
        assert_eq!(calendar, MarketCalendar::default());

        let config = MarketConfig {
            market_open: String::from("9:30"),
            ..MarketConfig::default()
        };
        assert!(matches!(
            MarketCalendar::from_config(&config),
            Err(ValidationError::InvalidSessionTime { .. })
        ));
    }
}
