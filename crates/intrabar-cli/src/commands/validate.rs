use std::path::Path;

use serde::Serialize;

use intrabar_core::storage::read_records;
use intrabar_core::{DataQualityValidator, ValidationReport};

use crate::cli::ValidateArgs;
use crate::error::CliError;

use super::{CommandOutcome, EXIT_VALIDATION_FAILED};

#[derive(Debug, Serialize)]
struct ValidateResponseData {
    path: String,
    rows: usize,
    report: ValidationReport,
}

pub fn run(args: &ValidateArgs) -> Result<CommandOutcome, CliError> {
    let data = validate_file(&args.path)?;
    let passed = data.report.passed;
    let outcome = CommandOutcome::ok(serde_json::to_value(data)?);

    Ok(if passed {
        outcome
    } else {
        outcome.with_exit_code(EXIT_VALIDATION_FAILED)
    })
}

fn validate_file(path: &Path) -> Result<ValidateResponseData, CliError> {
    let records = read_records(path)?;
    let report = DataQualityValidator::validate(&records);
    Ok(ValidateResponseData {
        path: path.display().to_string(),
        rows: records.len(),
        report,
    })
}
