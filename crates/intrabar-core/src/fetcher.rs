//! Multi-request history download.
//!
//! A range is split into provider-sized chunks and requested strictly in
//! order. The fetch is all-or-nothing: the first failing chunk aborts it and
//! everything gathered so far is dropped.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::calendar::MarketCalendar;
use crate::config::ApiConfig;
use crate::credentials::{CredentialProvider, TokenCache};
use crate::domain::{Bar, Candle, Frequency, PriceHistoryResponse, RangeBound, RequestChunk, Symbol};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::pacing::RequestPacer;
use crate::period::ChunkPlanner;
use crate::processor::CandleProcessor;
use crate::FetchError;

/// Longest slice of an error body kept in [`FetchError::Status`].
const ERROR_BODY_LIMIT: usize = 200;

pub struct HistoryFetcher {
    http: Arc<dyn HttpClient>,
    tokens: Arc<TokenCache>,
    credentials: Arc<dyn CredentialProvider>,
    api: ApiConfig,
    processor: CandleProcessor,
    deadline: Option<Duration>,
}

impl HistoryFetcher {
    pub fn new(
        http: Arc<dyn HttpClient>,
        tokens: Arc<TokenCache>,
        credentials: Arc<dyn CredentialProvider>,
        api: ApiConfig,
        calendar: MarketCalendar,
    ) -> Self {
        Self {
            http,
            tokens,
            credentials,
            api,
            processor: CandleProcessor::new(calendar),
            deadline: None,
        }
    }

    /// Bounds every request; exceeding it fails the fetch with
    /// [`FetchError::Timeout`].
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Downloads `[start, end]` for `symbol` and returns the cleaned series.
    ///
    /// Naive bounds are read as exchange wall-clock time. An inverted range
    /// issues no requests and yields an empty series.
    pub async fn fetch(
        &self,
        symbol: &str,
        start: impl Into<RangeBound>,
        end: impl Into<RangeBound>,
        frequency: Frequency,
    ) -> Result<Vec<Bar>, FetchError> {
        let symbol = Symbol::parse(symbol)?;
        let token = self.tokens.token(self.credentials.as_ref()).await?;

        let zone = self.processor.calendar().zone();
        let start = start.into().resolve(zone)?;
        let end = end.into().resolve(zone)?;

        info!(
            symbol = %symbol,
            %frequency,
            start = %zone.localize(start).date(),
            end = %zone.localize(end).date(),
            "starting history fetch"
        );

        let pacer = RequestPacer::from_millis(self.api.rate_limit_delay_ms);
        if pacer.is_enabled() {
            debug!(delay = ?pacer.delay(), "pacing requests");
        }
        let mut candles: Vec<Candle> = Vec::new();

        for chunk in ChunkPlanner::new(zone, frequency, start, end) {
            pacer.ready().await;
            let period = self.fetch_chunk(&symbol, &token, &chunk).await?;
            candles.extend(period);
        }

        let bars = self.processor.clean(candles);
        if bars.is_empty() {
            warn!(symbol = %symbol, %frequency, "no data retrieved");
        } else {
            info!(symbol = %symbol, %frequency, bars = bars.len(), "completed history fetch");
        }
        Ok(bars)
    }

    async fn fetch_chunk(
        &self,
        symbol: &Symbol,
        token: &str,
        chunk: &RequestChunk,
    ) -> Result<Vec<Candle>, FetchError> {
        let zone = self.processor.calendar().zone();
        let window_start = zone.localize(chunk.window.start()).display();
        info!(
            symbol = %symbol,
            period = chunk.size_days,
            frequency = chunk.granularity_minutes(),
            start = %window_start,
            end = %zone.localize(chunk.window.end()).display(),
            "fetching period"
        );

        let request = price_history_request(&self.api, symbol, chunk).with_bearer(token);
        let response = self.send(request, window_start).await?;

        if !response.is_success() {
            let body: String = response.body.chars().take(ERROR_BODY_LIMIT).collect();
            warn!(status = response.status, body = %body, "price history request failed");
            return Err(FetchError::Status {
                status: response.status,
                body,
            });
        }

        let parsed: PriceHistoryResponse = serde_json::from_str(&response.body)?;
        if parsed.candles.is_empty() {
            info!("no candles for this period");
        } else {
            info!(candles = parsed.candles.len(), "retrieved period");
        }
        Ok(parsed.candles)
    }

    async fn send(
        &self,
        request: HttpRequest,
        window_start: String,
    ) -> Result<HttpResponse, FetchError> {
        let call = self.http.execute(request);
        let result = match self.deadline {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| FetchError::Timeout {
                    window_start: window_start.clone(),
                })?,
            None => call.await,
        };

        result.map_err(|error| {
            warn!(%error, "price history transport failure");
            if error.timed_out() {
                FetchError::Timeout { window_start }
            } else {
                FetchError::Transport {
                    message: error.message().to_owned(),
                }
            }
        })
    }
}

/// Builds the unauthenticated GET for one chunk.
pub fn price_history_request(api: &ApiConfig, symbol: &Symbol, chunk: &RequestChunk) -> HttpRequest {
    HttpRequest::get(api.price_history_url())
        .with_header("accept", "application/json")
        .with_query("symbol", symbol.as_str())
        .with_query("periodType", "day")
        .with_query("period", chunk.size_days)
        .with_query("frequencyType", "minute")
        .with_query("frequency", chunk.granularity_minutes())
        .with_query("startDate", chunk.window.start_millis())
        .with_query("endDate", chunk.window.end_millis())
        .with_query("needExtendedHoursData", false)
        .with_query("needPreviousClose", false)
        .with_timeout_ms(api.timeout_ms)
}
