//! # Intrabar Core
//!
//! Historical intraday bar acquisition for a single exchange session.
//!
//! ## Overview
//!
//! - **Chunked downloads** sized to what the price history endpoint serves
//! - **Session filtering** against the exchange calendar, early closes included
//! - **Quality reports** over a series before it is persisted
//! - **Re-aggregation** of fine bars into coarser timeframes
//! - **Flat CSV storage**, one file per timeframe and symbol
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aggregate`] | Timeframe aggregation |
//! | [`calendar`] | Regular-session calendar with early-close rules |
//! | [`config`] | API and market configuration |
//! | [`credentials`] | Credential providers and the token cache |
//! | [`domain`] | Value types (Symbol, Bar, Candle, TimeWindow, ...) |
//! | [`error`] | Error types |
//! | [`fetcher`] | Multi-chunk history fetch |
//! | [`http_client`] | HTTP client abstraction |
//! | [`pacing`] | Inter-request pacing |
//! | [`period`] | Request window sizing |
//! | [`processor`] | Raw candle cleanup |
//! | [`quality`] | Dataset validation |
//! | [`storage`] | CSV persistence |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use intrabar_core::{
//!     AppConfig, EnvCredentialProvider, Frequency, HistoryFetcher, ReqwestHttpClient, TokenCache,
//! };
//! use time::macros::date;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load(None)?;
//!     let fetcher = HistoryFetcher::new(
//!         Arc::new(ReqwestHttpClient::new()),
//!         Arc::new(TokenCache::new()),
//!         Arc::new(EnvCredentialProvider::default()),
//!         config.api.clone(),
//!         config.calendar()?,
//!     );
//!
//!     let bars = fetcher
//!         .fetch("SPY", date!(2025 - 01 - 02), date!(2025 - 01 - 10), Frequency::ONE_MINUTE)
//!         .await?;
//!     println!("{} bars", bars.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │ HistoryFetcher  │────▶│ ChunkPlanner     │
//! └────────┬────────┘     └──────────────────┘
//!          │ one GET per chunk, paced
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ HttpClient      │     │ TokenCache       │
//! └────────┬────────┘     └──────────────────┘
//!          │ raw candles
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ CandleProcessor │────▶│ MarketCalendar   │
//! └────────┬────────┘     └──────────────────┘
//!          │ bars
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Quality / CSV   │────▶│ Aggregator       │
//! └─────────────────┘     └──────────────────┘
//! ```

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod pacing;
pub mod period;
pub mod processor;
pub mod quality;
pub mod storage;

pub use aggregate::{AggregationSpec, TimeframeAggregator};
pub use calendar::{DateRule, EarlyClose, MarketCalendar};
pub use config::{ApiConfig, AppConfig, MarketConfig};
pub use credentials::{CredentialProvider, EnvCredentialProvider, StaticToken, TokenCache};
pub use domain::{
    Bar, BarRecord, Candle, ExchangeZone, Frequency, LocalTime, PriceHistoryResponse, RangeBound,
    RequestChunk, Symbol, TimeWindow, Timeframe,
};
pub use error::{AuthError, ConfigError, FetchError, StorageError, ValidationError};
pub use fetcher::HistoryFetcher;
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpFuture, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};
pub use pacing::RequestPacer;
pub use period::{ChunkPlanner, PeriodOptimizer};
pub use processor::CandleProcessor;
pub use quality::{DataQualityValidator, QualityCheck, QualityIssue, Severity, ValidationReport};
