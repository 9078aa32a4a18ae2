//! Dataset quality checks run before a series is persisted.
//!
//! Validation never fails; every finding is reported as data in a
//! [`ValidationReport`]. `Error` findings fail the report, `Warning`
//! findings are informational.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::domain::{Bar, BarRecord};

/// Maximum number of offending rows kept per issue.
pub const MAX_SAMPLE_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCheck {
    EmptyDataset,
    DuplicateTimestamp,
    DuplicateDatetime,
    MissingField,
    NegativePrice,
    NonPositiveVolume,
    TimestampOrdering,
}

impl QualityCheck {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyDataset => "empty_dataset",
            Self::DuplicateTimestamp => "duplicate_timestamp",
            Self::DuplicateDatetime => "duplicate_datetime",
            Self::MissingField => "missing_field",
            Self::NegativePrice => "negative_price",
            Self::NonPositiveVolume => "non_positive_volume",
            Self::TimestampOrdering => "timestamp_ordering",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Offending row, identified by position and whatever identity it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRow {
    pub index: usize,
    pub timestamp: Option<i64>,
    pub datetime: Option<String>,
}

impl SampleRow {
    fn of(index: usize, record: &BarRecord) -> Self {
        Self {
            index,
            timestamp: record.timestamp,
            datetime: record.datetime.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityIssue {
    pub check: QualityCheck,
    pub severity: Severity,
    pub message: String,
    pub count: usize,
    pub sample_rows: Vec<SampleRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub issues: Vec<QualityIssue>,
}

impl ValidationReport {
    fn from_issues(issues: Vec<QualityIssue>) -> Self {
        let passed = issues
            .iter()
            .all(|issue| issue.severity != Severity::Error);
        Self { passed, issues }
    }

    pub fn issue(&self, check: QualityCheck) -> Option<&QualityIssue> {
        self.issues.iter().find(|issue| issue.check == check)
    }

    pub fn errors(&self) -> impl Iterator<Item = &QualityIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &QualityIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataQualityValidator;

impl DataQualityValidator {
    pub fn validate_bars(bars: &[Bar]) -> ValidationReport {
        let records: Vec<BarRecord> = bars.iter().map(BarRecord::from).collect();
        Self::validate(&records)
    }

    pub fn validate(records: &[BarRecord]) -> ValidationReport {
        if records.is_empty() {
            error!(check = QualityCheck::EmptyDataset.as_str(), "dataset is empty");
            return ValidationReport::from_issues(vec![QualityIssue {
                check: QualityCheck::EmptyDataset,
                severity: Severity::Error,
                message: String::from("dataset is empty"),
                count: 0,
                sample_rows: Vec::new(),
            }]);
        }

        info!(rows = records.len(), "running data quality validation");

        let issues: Vec<QualityIssue> = [
            check_duplicates(records, QualityCheck::DuplicateTimestamp, |r| r.timestamp),
            check_duplicates(records, QualityCheck::DuplicateDatetime, |r| {
                r.datetime.clone()
            }),
            check_missing_fields(records),
            check_negative_prices(records),
            check_volume(records),
            check_ordering(records),
        ]
        .into_iter()
        .flatten()
        .collect();

        let report = ValidationReport::from_issues(issues);
        if report.passed {
            info!(warnings = report.warnings().count(), "data quality validation passed");
        }
        report
    }
}

fn check_duplicates<K, F>(records: &[BarRecord], check: QualityCheck, key: F) -> Option<QualityIssue>
where
    K: Eq + Hash,
    F: Fn(&BarRecord) -> Option<K>,
{
    let keys: Vec<Option<K>> = records.iter().map(&key).collect();
    let mut seen: HashMap<&K, usize> = HashMap::new();
    for value in keys.iter().flatten() {
        *seen.entry(value).or_default() += 1;
    }

    let rows = keys
        .iter()
        .enumerate()
        .filter(|(_, value)| value.as_ref().is_some_and(|v| seen[v] > 1))
        .map(|(index, _)| index);

    let column = match check {
        QualityCheck::DuplicateTimestamp => "timestamp",
        _ => "datetime",
    };
    issue_for_rows(records, check, Severity::Error, rows, |count| {
        format!("found {count} rows with duplicate {column} values")
    })
}

fn check_missing_fields(records: &[BarRecord]) -> Option<QualityIssue> {
    let mut per_column: Vec<(&'static str, usize)> =
        BarRecord::COLUMNS.iter().map(|column| (*column, 0)).collect();
    let mut rows = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let missing = record.missing_fields();
        if missing.is_empty() {
            continue;
        }
        rows.push(index);
        for field in missing {
            if let Some(slot) = per_column.iter_mut().find(|(column, _)| *column == field) {
                slot.1 += 1;
            }
        }
    }

    let summary = per_column
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(column, count)| format!("{column}={count}"))
        .collect::<Vec<_>>()
        .join(", ");

    issue_for_rows(records, QualityCheck::MissingField, Severity::Warning, rows, |count| {
        format!("found {count} rows with missing values ({summary})")
    })
}

fn check_negative_prices(records: &[BarRecord]) -> Option<QualityIssue> {
    let rows = records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.prices().any(|(_, price)| price < 0.0))
        .map(|(index, _)| index);

    issue_for_rows(records, QualityCheck::NegativePrice, Severity::Error, rows, |count| {
        format!("found {count} rows with negative prices")
    })
}

fn check_volume(records: &[BarRecord]) -> Option<QualityIssue> {
    let rows = records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.volume.is_some_and(|volume| volume <= 0))
        .map(|(index, _)| index);

    issue_for_rows(
        records,
        QualityCheck::NonPositiveVolume,
        Severity::Warning,
        rows,
        |count| format!("found {count} rows with zero or negative volume"),
    )
}

fn check_ordering(records: &[BarRecord]) -> Option<QualityIssue> {
    let mut previous: Option<i64> = None;
    let mut rows = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let Some(timestamp) = record.timestamp else {
            continue;
        };
        if previous.is_some_and(|last| timestamp < last) {
            rows.push(index);
        }
        previous = Some(timestamp);
    }

    issue_for_rows(
        records,
        QualityCheck::TimestampOrdering,
        Severity::Error,
        rows,
        |count| format!("timestamps are not in ascending order ({count} rows step backwards)"),
    )
}

fn issue_for_rows(
    records: &[BarRecord],
    check: QualityCheck,
    severity: Severity,
    rows: impl IntoIterator<Item = usize>,
    message: impl FnOnce(usize) -> String,
) -> Option<QualityIssue> {
    let rows: Vec<usize> = rows.into_iter().collect();
    if rows.is_empty() {
        info!(check = check.as_str(), "check passed");
        return None;
    }

    let count = rows.len();
    let message = message(count);
    let sample_rows: Vec<SampleRow> = rows
        .iter()
        .take(MAX_SAMPLE_ROWS)
        .map(|&index| SampleRow::of(index, &records[index]))
        .collect();

    match severity {
        Severity::Error => error!(check = check.as_str(), count, ?sample_rows, "{message}"),
        Severity::Warning => warn!(check = check.as_str(), count, ?sample_rows, "{message}"),
    }

    Some(QualityIssue {
        check,
        severity,
        message,
        count,
        sample_rows,
    })
}
