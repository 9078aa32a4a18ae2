mod aggregate;
mod fetch;
mod validate;

use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Exit code when at least one fetch job did not store a series.
pub const EXIT_JOBS_FAILED: u8 = 3;
/// Exit code when a validated file has error-level findings.
pub const EXIT_VALIDATION_FAILED: u8 = 4;

/// JSON document printed on stdout plus the process exit code.
pub struct CommandOutcome {
    pub data: Value,
    pub exit_code: u8,
}

impl CommandOutcome {
    pub fn ok(data: Value) -> Self {
        Self { data, exit_code: 0 }
    }

    pub fn with_exit_code(mut self, exit_code: u8) -> Self {
        self.exit_code = exit_code;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandOutcome, CliError> {
    match &cli.command {
        Command::Fetch(args) => fetch::run(args, cli).await,
        Command::Aggregate(args) => aggregate::run(args, cli),
        Command::Validate(args) => validate::run(args),
    }
}
