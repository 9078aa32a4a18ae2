use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::domain::{ExchangeZone, Frequency};
use crate::ValidationError;

/// Inclusive range of timezone-aware instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl TimeWindow {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidTimeWindow);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn end(&self) -> OffsetDateTime {
        self.end
    }

    pub fn start_millis(&self) -> i64 {
        epoch_millis(self.start)
    }

    pub fn end_millis(&self) -> i64 {
        epoch_millis(self.end)
    }
}

/// One provider request: a window plus the sizing sent alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestChunk {
    pub window: TimeWindow,
    pub size_days: i64,
    pub frequency: Frequency,
}

impl RequestChunk {
    pub fn granularity_minutes(&self) -> u32 {
        self.frequency.minutes()
    }
}

/// Start or end of a requested history range.
///
/// Naive values are read as exchange wall-clock time; aware values are kept
/// as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Naive(PrimitiveDateTime),
    Aware(OffsetDateTime),
}

impl RangeBound {
    pub fn resolve(self, zone: ExchangeZone) -> Result<OffsetDateTime, ValidationError> {
        match self {
            Self::Naive(local) => zone.assume_local(local),
            Self::Aware(instant) => Ok(instant),
        }
    }
}

impl From<Date> for RangeBound {
    fn from(date: Date) -> Self {
        Self::Naive(date.midnight())
    }
}

impl From<PrimitiveDateTime> for RangeBound {
    fn from(local: PrimitiveDateTime) -> Self {
        Self::Naive(local)
    }
}

impl From<OffsetDateTime> for RangeBound {
    fn from(instant: OffsetDateTime) -> Self {
        Self::Aware(instant)
    }
}

pub(crate) fn epoch_millis(instant: OffsetDateTime) -> i64 {
    // i64 millis cover every date `time` can represent
    (instant.unix_timestamp_nanos() / 1_000_000) as i64
}
