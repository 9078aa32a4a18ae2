use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;
use crate::error::CliError;

/// Installs the global subscriber. Logs go to stderr so stdout carries only
/// the JSON result.
pub fn init(format: LogFormat) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|error| CliError::Logging(error.to_string()))
}
