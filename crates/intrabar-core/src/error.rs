use thiserror::Error;

/// Input and contract errors exposed by `intrabar-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or '$': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid timeframe '{value}', expected one of 1m, 3m, 5m, 10m, 15m, 30m, 1h, 1d")]
    InvalidTimeframe { value: String },
    #[error("unsupported frequency {minutes}m, expected one of 1, 5, 10, 15, 30")]
    UnsupportedFrequency { minutes: u32 },
    #[error("cannot aggregate {from} bars into finer {to} bars")]
    AggregationTargetTooFine { from: String, to: String },

    #[error("unknown timezone '{value}'")]
    InvalidTimezone { value: String },
    #[error("invalid session time '{value}', expected HH:MM:SS")]
    InvalidSessionTime { value: String },
    #[error("local time '{value}' does not exist in the exchange timezone")]
    NonexistentLocalTime { value: String },
    #[error("timestamp {millis}ms is out of range")]
    TimestampOutOfRange { millis: i64 },
    #[error("time window start must not be after end")]
    InvalidTimeWindow,

    #[error("row {row}: field '{field}' is missing")]
    MissingField { row: usize, field: &'static str },
}

/// Failure reported by a credential provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("credential provider failed: {message}")]
pub struct AuthError {
    message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Terminal failure of a multi-chunk history fetch.
///
/// Any variant discards every chunk accumulated so far.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Input(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request for window starting {window_start} timed out")]
    Timeout { window_start: String },
}

/// CSV persistence failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
