//! Re-aggregation of a bar series into a coarser timeframe.
//!
//! Buckets are aligned to exchange wall-clock boundaries: a 3m bucket starts
//! on a minute-of-day divisible by three, 1h on the hour, 1d at local
//! midnight. A bucket is a contiguous run of input bars sharing one start.

use time::{Date, PrimitiveDateTime, Time};
use tracing::{info, warn};

use crate::domain::{Bar, ExchangeZone, Timeframe};
use crate::ValidationError;

const MINUTES_PER_DAY: u32 = 1_440;

/// Source and target timeframes of an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationSpec {
    source: Timeframe,
    target: Timeframe,
}

impl AggregationSpec {
    /// Fails when `target` is finer than `source`.
    pub fn new(source: Timeframe, target: Timeframe) -> Result<Self, ValidationError> {
        if target < source {
            return Err(ValidationError::AggregationTargetTooFine {
                from: source.to_string(),
                to: target.to_string(),
            });
        }
        Ok(Self { source, target })
    }

    pub fn source(&self) -> Timeframe {
        self.source
    }

    pub fn target(&self) -> Timeframe {
        self.target
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeframeAggregator {
    zone: ExchangeZone,
}

impl TimeframeAggregator {
    pub fn new(zone: ExchangeZone) -> Self {
        Self { zone }
    }

    /// Aggregates `bars` into `spec.target()` buckets.
    ///
    /// Output bars keep the first input timestamp of their bucket; the
    /// `datetime` column is the bucket start in exchange time.
    pub fn aggregate(&self, bars: &[Bar], spec: AggregationSpec) -> Vec<Bar> {
        let target = spec.target();
        let mut output: Vec<Bar> = Vec::new();
        let mut current: Option<PrimitiveDateTime> = None;

        for bar in bars {
            let Some(start) = self.bucket_start(bar, target) else {
                continue;
            };

            match output.last_mut() {
                Some(last) if current == Some(start) => {
                    last.high = last.high.max(bar.high);
                    last.low = last.low.min(bar.low);
                    last.close = bar.close;
                    last.volume += bar.volume;
                }
                _ => {
                    current = Some(start);
                    output.push(Bar {
                        timestamp: bar.timestamp,
                        datetime: self.label(start, bar),
                        open: bar.open,
                        high: bar.high,
                        low: bar.low,
                        close: bar.close,
                        volume: bar.volume,
                    });
                }
            }
        }

        info!(
            source = %spec.source(),
            target = %target,
            input = bars.len(),
            output = output.len(),
            "aggregated bars"
        );
        output
    }

    fn bucket_start(&self, bar: &Bar, target: Timeframe) -> Option<PrimitiveDateTime> {
        let local = match self.zone.localize_millis(bar.timestamp) {
            Ok(local) => local,
            Err(error) => {
                warn!(timestamp = bar.timestamp, %error, "skipping bar");
                return None;
            }
        };
        Some(floor_to_bucket(local.date(), local.time(), target.minutes()))
    }

    fn label(&self, start: PrimitiveDateTime, first: &Bar) -> String {
        self.zone
            .assume_local(start)
            .map(|instant| self.zone.localize(instant).display())
            .unwrap_or_else(|_| first.datetime.clone())
    }
}

fn floor_to_bucket(date: Date, time: Time, bucket_minutes: u32) -> PrimitiveDateTime {
    if bucket_minutes >= MINUTES_PER_DAY {
        return date.midnight();
    }

    let minute_of_day = u32::from(time.hour()) * 60 + u32::from(time.minute());
    let floored = minute_of_day - minute_of_day % bucket_minutes;
    // floored < 1440, so both parts fit their ranges
    let bucket =
        Time::from_hms((floored / 60) as u8, (floored % 60) as u8, 0).unwrap_or(Time::MIDNIGHT);
    PrimitiveDateTime::new(date, bucket)
}
