use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] intrabar_core::ValidationError),

    #[error(transparent)]
    Config(#[from] intrabar_core::ConfigError),

    #[error(transparent)]
    Storage(#[from] intrabar_core::StorageError),

    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("failed to read list file {path}: {source}")]
    ListFile {
        path: String,
        source: std::io::Error,
    },

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_)
            | Self::InvalidDate { .. }
            | Self::Config(_)
            | Self::ListFile { .. } => 2,
            Self::Logging(_) => 1,
            Self::Storage(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
