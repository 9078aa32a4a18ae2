//! # Domain Models
//!
//! Canonical value types shared by every stage of the bar pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, upper-cased ticker |
//! | [`Timeframe`] | Bar granularity label (1m .. 1d) |
//! | [`Frequency`] | Minute granularity the provider can serve |
//! | [`Candle`] | Raw provider record, not yet session-filtered |
//! | [`Bar`] | Clean, exchange-localized OHLCV bar |
//! | [`BarRecord`] | One persisted CSV row, every column optional |
//! | [`TimeWindow`] | Inclusive, timezone-aware instant range |
//! | [`RequestChunk`] | One provider request window |
//! | [`ExchangeZone`] | IANA timezone of the exchange |

mod bar;
mod symbol;
mod timeframe;
mod window;
mod zone;

pub use bar::{Bar, BarRecord, Candle, PriceHistoryResponse};
pub use symbol::Symbol;
pub use timeframe::{Frequency, Timeframe};
pub use window::{RangeBound, RequestChunk, TimeWindow};
pub use zone::{ExchangeZone, LocalTime};
