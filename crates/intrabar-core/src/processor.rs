//! Raw candle cleanup.

use tracing::{debug, info, warn};

use crate::calendar::MarketCalendar;
use crate::domain::{Bar, Candle};

/// Turns raw provider candles into a session-only, de-duplicated series.
#[derive(Debug, Clone, Default)]
pub struct CandleProcessor {
    calendar: MarketCalendar,
}

impl CandleProcessor {
    pub fn new(calendar: MarketCalendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &MarketCalendar {
        &self.calendar
    }

    /// Localizes, session-filters, sorts by timestamp and drops duplicate
    /// timestamps (first occurrence wins).
    pub fn clean(&self, candles: impl IntoIterator<Item = Candle>) -> Vec<Bar> {
        let zone = self.calendar.zone();
        let mut received = 0_usize;
        let mut bars = Vec::new();

        for candle in candles {
            received += 1;
            let local = match zone.localize_millis(candle.datetime) {
                Ok(local) => local,
                Err(error) => {
                    warn!(timestamp = candle.datetime, %error, "dropping candle");
                    continue;
                }
            };
            if !self
                .calendar
                .is_session_time(local.date(), local.time())
            {
                continue;
            }

            bars.push(Bar {
                timestamp: candle.datetime,
                datetime: local.display(),
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
                volume: candle.volume,
            });
        }

        let in_session = bars.len();
        // stable, so the first of equal timestamps survives dedup
        bars.sort_by_key(|bar| bar.timestamp);
        bars.dedup_by_key(|bar| bar.timestamp);

        debug!(
            received,
            in_session,
            duplicates = in_session - bars.len(),
            "cleaned candles"
        );
        info!(bars = bars.len(), "processed candles");
        bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2025-01-02 09:30:00 EST
    const OPEN_MS: i64 = 1_735_828_200_000;
    const MINUTE_MS: i64 = 60_000;

    fn candle(datetime: i64, close: f64) -> Candle {
        Candle {
            datetime,
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(CandleProcessor::default().clean(Vec::new()).is_empty());
    }

    #[test]
    fn drops_out_of_session_candles_and_formats_local_time() {
        let processor = CandleProcessor::default();
        let bars = processor.clean(vec![
            candle(OPEN_MS - MINUTE_MS, 1.0),
            candle(OPEN_MS, 2.0),
            candle(OPEN_MS + 390 * MINUTE_MS, 3.0),
        ]);

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].timestamp, OPEN_MS);
        assert_eq!(bars[0].datetime, "2025-01-02 09:30:00 EST");
        assert_eq!(bars[0].close, 2.0);
    }

    #[test]
    fn sorts_and_keeps_first_duplicate() {
        let processor = CandleProcessor::default();
        let bars = processor.clean(vec![
            candle(OPEN_MS + 2 * MINUTE_MS, 3.0),
            candle(OPEN_MS, 1.0),
            candle(OPEN_MS + 2 * MINUTE_MS, 9.0),
            candle(OPEN_MS + MINUTE_MS, 2.0),
        ]);

        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert!(bars.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));
    }

    #[test]
    fn unrepresentable_timestamps_are_dropped() {
        let bars = CandleProcessor::default().clean(vec![candle(i64::MAX, 1.0), candle(OPEN_MS, 2.0)]);
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let processor = CandleProcessor::default();
        let once = processor.clean(vec![
            candle(OPEN_MS + MINUTE_MS, 2.0),
            candle(OPEN_MS, 1.0),
            candle(OPEN_MS, 5.0),
            candle(OPEN_MS - MINUTE_MS, 0.5),
        ]);
        let twice = processor.clean(once.iter().map(Candle::from));

        assert_eq!(once, twice);
    }
}
