//! Request window sizing.
//!
//! The price history endpoint answers most reliably for bounded windows, so a
//! range is walked greedily with the largest window from a fixed ladder that
//! still fits the days left.

use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::domain::{ExchangeZone, Frequency, RequestChunk, TimeWindow};

/// Candidate window sizes in days, largest first.
pub const WINDOW_LADDER: [i64; 6] = [10, 5, 4, 3, 2, 1];

/// Picks request window sizes from [`WINDOW_LADDER`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodOptimizer;

impl PeriodOptimizer {
    /// Largest ladder size not exceeding `days_remaining`, or 0 once the
    /// range is exhausted.
    pub fn optimal_window(days_remaining: i64) -> i64 {
        WINDOW_LADDER
            .into_iter()
            .find(|&size| size <= days_remaining)
            .unwrap_or(0)
    }
}

/// Walks `[start, end]` as a sequence of provider-legal request chunks.
///
/// Windows are contiguous by calendar day: each one starts the day after the
/// previous one ended. Day steps are taken on exchange wall-clock time so
/// midnight-aligned windows stay aligned across DST changes.
#[derive(Debug, Clone)]
pub struct ChunkPlanner {
    zone: ExchangeZone,
    frequency: Frequency,
    next_start: OffsetDateTime,
    end: OffsetDateTime,
    done: bool,
}

impl ChunkPlanner {
    pub fn new(
        zone: ExchangeZone,
        frequency: Frequency,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Self {
        Self {
            zone,
            frequency,
            next_start: start,
            end,
            done: false,
        }
    }

    fn advance_days(&self, instant: OffsetDateTime, days: i64) -> OffsetDateTime {
        let local = self.zone.localize(instant).instant();
        let shifted = PrimitiveDateTime::new(local.date(), local.time()) + Duration::days(days);
        self.zone
            .assume_local(shifted)
            .unwrap_or_else(|_| instant + Duration::days(days))
    }

    /// Calendar days from `from` to `to` on the exchange clock; a 23-hour
    /// spring-forward day still counts as one.
    fn local_days_between(&self, from: OffsetDateTime, to: OffsetDateTime) -> i64 {
        (self.zone.localize(to).date() - self.zone.localize(from).date()).whole_days()
    }
}

impl Iterator for ChunkPlanner {
    type Item = RequestChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next_start > self.end {
            self.done = true;
            return None;
        }

        let days_remaining = self.local_days_between(self.next_start, self.end) + 1;
        let size_days = PeriodOptimizer::optimal_window(days_remaining);
        if size_days == 0 {
            self.done = true;
            return None;
        }

        let start = self.next_start;
        let end = self.advance_days(start, size_days - 1).min(self.end);
        let window = TimeWindow::new(start, end).ok()?;

        self.next_start = self.advance_days(end, 1);

        Some(RequestChunk {
            window,
            size_days,
            frequency: self.frequency,
        })
    }
}

impl std::iter::FusedIterator for ChunkPlanner {}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn plan(start: time::Date, end: time::Date) -> Vec<RequestChunk> {
        let zone = ExchangeZone::NEW_YORK;
        ChunkPlanner::new(
            zone,
            Frequency::FIVE_MINUTES,
            zone.start_of_day(start).expect("start"),
            zone.start_of_day(end).expect("end"),
        )
        .collect()
    }

    #[test]
    fn optimal_window_picks_largest_fitting_size() {
        let expected = [
            (-3, 0),
            (0, 0),
            (1, 1),
            (2, 2),
            (3, 3),
            (4, 4),
            (5, 5),
            (7, 5),
            (9, 5),
            (10, 10),
            (13, 10),
            (23, 10),
            (400, 10),
        ];
        for (days, size) in expected {
            assert_eq!(PeriodOptimizer::optimal_window(days), size, "days={days}");
        }
    }

    #[test]
    fn twenty_three_days_split_into_ten_ten_three() {
        let chunks = plan(date!(2025 - 01 - 01), date!(2025 - 01 - 23));
        let sizes: Vec<i64> = chunks.iter().map(|chunk| chunk.size_days).collect();
        assert_eq!(sizes, vec![10, 10, 3]);
    }

    #[test]
    fn windows_are_contiguous_and_cover_range() {
        let zone = ExchangeZone::NEW_YORK;
        let chunks = plan(date!(2025 - 01 - 01), date!(2025 - 01 - 23));

        let local_dates: Vec<(time::Date, time::Date)> = chunks
            .iter()
            .map(|chunk| {
                (
                    zone.localize(chunk.window.start()).date(),
                    zone.localize(chunk.window.end()).date(),
                )
            })
            .collect();

        assert_eq!(
            local_dates,
            vec![
                (date!(2025 - 01 - 01), date!(2025 - 01 - 10)),
                (date!(2025 - 01 - 11), date!(2025 - 01 - 20)),
                (date!(2025 - 01 - 21), date!(2025 - 01 - 23)),
            ]
        );
    }

    #[test]
    fn single_day_range_yields_one_chunk() {
        let chunks = plan(date!(2025 - 02 - 03), date!(2025 - 02 - 03));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].size_days, 1);
        assert_eq!(chunks[0].window.start(), chunks[0].window.end());
    }

    #[test]
    fn inverted_range_yields_nothing() {
        assert!(plan(date!(2025 - 02 - 03), date!(2025 - 02 - 01)).is_empty());
    }

    #[test]
    fn windows_stay_midnight_aligned_across_dst() {
        let zone = ExchangeZone::NEW_YORK;
        let chunks = plan(date!(2025 - 03 - 01), date!(2025 - 03 - 20));

        for chunk in &chunks {
            assert_eq!(zone.localize(chunk.window.start()).time(), time::Time::MIDNIGHT);
        }
        let last = chunks.last().expect("at least one chunk");
        assert_eq!(zone.localize(last.window.end()).date(), date!(2025 - 03 - 20));
    }

    #[test]
    fn spring_forward_range_is_sized_by_calendar_days() {
        let spring = plan(date!(2025 - 03 - 05), date!(2025 - 03 - 14));
        let winter = plan(date!(2025 - 01 - 05), date!(2025 - 01 - 14));

        let sizes = |chunks: &[RequestChunk]| -> Vec<i64> {
            chunks.iter().map(|chunk| chunk.size_days).collect()
        };
        assert_eq!(sizes(&spring), vec![10]);
        assert_eq!(sizes(&winter), vec![10]);
    }

    #[test]
    fn fall_back_range_keeps_ten_day_windows() {
        let zone = ExchangeZone::NEW_YORK;
        let chunks = plan(date!(2025 - 10 - 28), date!(2025 - 11 - 06));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].size_days, 10);
        assert_eq!(zone.localize(chunks[0].window.end()).date(), date!(2025 - 11 - 06));
    }
}
