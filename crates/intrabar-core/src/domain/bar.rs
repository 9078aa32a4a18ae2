use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Raw candle exactly as the price history endpoint returns it.
///
/// Missing numeric fields default to zero here so later stages never see a
/// partially populated record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Candle {
    /// Epoch milliseconds, UTC.
    #[serde(default)]
    pub datetime: i64,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub close: f64,
    #[serde(default)]
    pub volume: i64,
}

impl From<&Bar> for Candle {
    fn from(bar: &Bar) -> Self {
        Self {
            datetime: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// Body of a successful price history response.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PriceHistoryResponse {
    #[serde(default)]
    pub candles: Vec<Candle>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub empty: Option<bool>,
}

/// Session-filtered OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Epoch milliseconds, UTC. Unique and increasing within a series.
    pub timestamp: i64,
    /// Exchange wall-clock time with zone abbreviation.
    pub datetime: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// One row of a persisted series.
///
/// Columns are optional so files with holes can still be loaded and
/// diagnosed. A NaN price counts as missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BarRecord {
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

impl BarRecord {
    pub const COLUMNS: [&'static str; 7] = [
        "timestamp",
        "datetime",
        "open",
        "high",
        "low",
        "close",
        "volume",
    ];

    /// Names of the columns that are missing on this row, in column order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.timestamp.is_some(),
            self.datetime.is_some(),
            present_price(self.open),
            present_price(self.high),
            present_price(self.low),
            present_price(self.close),
            self.volume.is_some(),
        ];

        Self::COLUMNS
            .into_iter()
            .zip(present)
            .filter_map(|(column, present)| (!present).then_some(column))
            .collect()
    }

    /// Prices that are present, as `(column, value)` pairs.
    pub fn prices(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.filter(|v| !v.is_nan()).map(|v| (column, v)))
    }

    /// Converts a complete row into a [`Bar`]; `row` is used in the error.
    pub fn into_bar(self, row: usize) -> Result<Bar, ValidationError> {
        if let Some(field) = self.missing_fields().first() {
            return Err(ValidationError::MissingField { row, field });
        }

        let missing = |field| ValidationError::MissingField { row, field };
        Ok(Bar {
            timestamp: self.timestamp.ok_or_else(|| missing("timestamp"))?,
            datetime: self.datetime.ok_or_else(|| missing("datetime"))?,
            open: self.open.ok_or_else(|| missing("open"))?,
            high: self.high.ok_or_else(|| missing("high"))?,
            low: self.low.ok_or_else(|| missing("low"))?,
            close: self.close.ok_or_else(|| missing("close"))?,
            volume: self.volume.ok_or_else(|| missing("volume"))?,
        })
    }
}

impl From<&Bar> for BarRecord {
    fn from(bar: &Bar) -> Self {
        Self {
            timestamp: Some(bar.timestamp),
            datetime: Some(bar.datetime.clone()),
            open: Some(bar.open),
            high: Some(bar.high),
            low: Some(bar.low),
            close: Some(bar.close),
            volume: Some(bar.volume),
        }
    }
}

fn present_price(value: Option<f64>) -> bool {
    value.is_some_and(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candle_defaults_missing_fields_to_zero() {
        let candle: Candle =
            serde_json::from_str(r#"{"datetime": 1735828200000, "close": 101.5}"#)
                .expect("partial candle should parse");

        assert_eq!(candle.datetime, 1_735_828_200_000);
        assert_eq!(candle.open, 0.0);
        assert_eq!(candle.close, 101.5);
        assert_eq!(candle.volume, 0);
    }

    #[test]
    fn response_without_candles_is_empty() {
        let response: PriceHistoryResponse =
            serde_json::from_str(r#"{"symbol": "SPY", "empty": true}"#).expect("must parse");
        assert!(response.candles.is_empty());
        assert_eq!(response.empty, Some(true));
    }

    #[test]
    fn nan_price_counts_as_missing() {
        let record = BarRecord {
            timestamp: Some(1),
            datetime: Some(String::from("2025-01-02 09:30:00 EST")),
            open: Some(f64::NAN),
            high: Some(2.0),
            low: Some(1.0),
            close: Some(1.5),
            volume: None,
        };

        assert_eq!(record.missing_fields(), vec!["open", "volume"]);
        assert_eq!(record.prices().count(), 3);
    }

    #[test]
    fn incomplete_row_reports_first_missing_field() {
        let record = BarRecord {
            timestamp: Some(1),
            ..BarRecord::default()
        };
        assert_eq!(
            record.into_bar(7),
            Err(ValidationError::MissingField {
                row: 7,
                field: "datetime"
            })
        );
    }
}
