use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::{error, info, warn};

use intrabar_core::storage::{series_path, write_bars};
use intrabar_core::{
    AppConfig, DataQualityValidator, EnvCredentialProvider, Frequency, HistoryFetcher,
    ReqwestHttpClient, Symbol, Timeframe, TokenCache, ValidationReport,
};

use crate::cli::{Cli, FetchArgs};
use crate::error::CliError;

use super::{CommandOutcome, EXIT_JOBS_FAILED};

#[derive(Debug, Clone, PartialEq, Eq)]
struct FetchJob {
    symbol: Symbol,
    timeframe: Timeframe,
    frequency: Frequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum JobStatus {
    Saved,
    /// Written despite failed validation.
    Forced,
    Rejected,
    Empty,
    Failed,
}

impl JobStatus {
    const fn stored(self) -> bool {
        matches!(self, Self::Saved | Self::Forced)
    }
}

#[derive(Debug, Serialize)]
struct JobSummary {
    symbol: String,
    timeframe: Timeframe,
    status: JobStatus,
    bars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct FetchResponseData {
    start: String,
    end: String,
    jobs: Vec<JobSummary>,
    failed: usize,
}

pub async fn run(args: &FetchArgs, cli: &Cli) -> Result<CommandOutcome, CliError> {
    let jobs = plan_jobs(&read_symbols(args)?, &read_timeframes(args)?)?;
    let config = AppConfig::load(cli.config.as_deref())?;
    let calendar = config.calendar()?;

    let start = parse_date(&args.start)?;
    let end = match &args.end {
        Some(value) => parse_date(value)?,
        None => calendar.zone().localize(OffsetDateTime::now_utc()).date(),
    };

    let fetcher = HistoryFetcher::new(
        Arc::new(ReqwestHttpClient::new()),
        Arc::new(TokenCache::new()),
        Arc::new(EnvCredentialProvider::default()),
        config.api.clone(),
        calendar,
    );

    let data = run_jobs(&fetcher, &jobs, start, end, &cli.data_dir, args.force).await;
    let failed = data.failed;
    let outcome = CommandOutcome::ok(serde_json::to_value(data)?);

    Ok(if failed > 0 {
        outcome.with_exit_code(EXIT_JOBS_FAILED)
    } else {
        outcome
    })
}

async fn run_jobs(
    fetcher: &HistoryFetcher,
    jobs: &[FetchJob],
    start: Date,
    end: Date,
    data_dir: &Path,
    force: bool,
) -> FetchResponseData {
    let mut summaries = Vec::with_capacity(jobs.len());
    for job in jobs {
        summaries.push(run_job(fetcher, job, start, end, data_dir, force).await);
    }

    let failed = summaries
        .iter()
        .filter(|summary| !summary.status.stored())
        .count();
    FetchResponseData {
        start: start.to_string(),
        end: end.to_string(),
        jobs: summaries,
        failed,
    }
}

async fn run_job(
    fetcher: &HistoryFetcher,
    job: &FetchJob,
    start: Date,
    end: Date,
    data_dir: &Path,
    force: bool,
) -> JobSummary {
    let mut summary = JobSummary {
        symbol: job.symbol.to_string(),
        timeframe: job.timeframe,
        status: JobStatus::Failed,
        bars: 0,
        path: None,
        report: None,
        error: None,
    };

    let bars = match fetcher
        .fetch(job.symbol.as_str(), start, end, job.frequency)
        .await
    {
        Ok(bars) => bars,
        Err(fetch_error) => {
            error!(symbol = %job.symbol, timeframe = %job.timeframe, error = %fetch_error, "fetch failed");
            summary.error = Some(fetch_error.to_string());
            return summary;
        }
    };

    summary.bars = bars.len();
    if bars.is_empty() {
        warn!(symbol = %job.symbol, timeframe = %job.timeframe, "no data retrieved");
        summary.status = JobStatus::Empty;
        return summary;
    }

    let report = DataQualityValidator::validate_bars(&bars);
    let passed = report.passed;
    summary.report = Some(report);
    if !passed && !force {
        error!(symbol = %job.symbol, timeframe = %job.timeframe, "data quality issues detected, not saving");
        summary.status = JobStatus::Rejected;
        return summary;
    }

    let path = series_path(data_dir, job.timeframe, &job.symbol);
    match write_bars(&path, &bars) {
        Ok(()) => {
            info!(path = %path.display(), "series saved");
            summary.status = if passed {
                JobStatus::Saved
            } else {
                JobStatus::Forced
            };
            summary.path = Some(path.display().to_string());
        }
        Err(storage_error) => {
            error!(path = %path.display(), error = %storage_error, "failed to save series");
            summary.error = Some(storage_error.to_string());
        }
    }
    summary
}

fn plan_jobs(symbols: &[String], timeframes: &[String]) -> Result<Vec<FetchJob>, CliError> {
    let symbols = symbols
        .iter()
        .map(|raw| Symbol::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let timeframes = timeframes
        .iter()
        .map(|raw| -> Result<(Timeframe, Frequency), CliError> {
            let timeframe: Timeframe = raw.parse()?;
            Ok((timeframe, Frequency::try_from(timeframe)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(symbols
        .iter()
        .flat_map(|symbol| {
            timeframes.iter().map(|&(timeframe, frequency)| FetchJob {
                symbol: symbol.clone(),
                timeframe,
                frequency,
            })
        })
        .collect())
}

fn read_symbols(args: &FetchArgs) -> Result<Vec<String>, CliError> {
    match &args.symbols_file {
        Some(path) => read_list_file(path),
        None => Ok(args.symbols.clone()),
    }
}

fn read_timeframes(args: &FetchArgs) -> Result<Vec<String>, CliError> {
    match &args.timeframes_file {
        Some(path) => read_list_file(path),
        None if args.timeframes.is_empty() => Ok(vec![Timeframe::OneMinute.to_string()]),
        None => Ok(args.timeframes.clone()),
    }
}

/// One entry per line; blank lines and `#` comments are skipped.
fn read_list_file(path: &Path) -> Result<Vec<String>, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::ListFile {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_list(&contents))
}

fn parse_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

fn parse_date(value: &str) -> Result<Date, CliError> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        CliError::InvalidDate {
            value: value.to_owned(),
        }
    })
}
