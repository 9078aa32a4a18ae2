use std::path::Path;

use serde::Serialize;

use intrabar_core::storage::{read_bars, series_path, write_bars};
use intrabar_core::{
    AggregationSpec, AppConfig, ExchangeZone, Symbol, Timeframe, TimeframeAggregator,
};

use crate::cli::{AggregateArgs, Cli};
use crate::error::CliError;

use super::CommandOutcome;

#[derive(Debug, Serialize)]
struct AggregateResponseData {
    symbol: String,
    from: Timeframe,
    to: Timeframe,
    source_path: String,
    target_path: String,
    input_bars: usize,
    output_bars: usize,
}

pub fn run(args: &AggregateArgs, cli: &Cli) -> Result<CommandOutcome, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let spec = AggregationSpec::new(args.from.parse()?, args.to.parse()?)?;
    let config = AppConfig::load(cli.config.as_deref())?;
    let zone = config.calendar()?.zone();

    let data = aggregate_series(&cli.data_dir, &symbol, spec, zone)?;
    Ok(CommandOutcome::ok(serde_json::to_value(data)?))
}

fn aggregate_series(
    data_dir: &Path,
    symbol: &Symbol,
    spec: AggregationSpec,
    zone: ExchangeZone,
) -> Result<AggregateResponseData, CliError> {
    let source_path = series_path(data_dir, spec.source(), symbol);
    let bars = read_bars(&source_path)?;

    let aggregated = TimeframeAggregator::new(zone).aggregate(&bars, spec);

    let target_path = series_path(data_dir, spec.target(), symbol);
    write_bars(&target_path, &aggregated)?;

    Ok(AggregateResponseData {
        symbol: symbol.to_string(),
        from: spec.source(),
        to: spec.target(),
        source_path: source_path.display().to_string(),
        target_path: target_path.display().to_string(),
        input_bars: bars.len(),
        output_bars: aggregated.len(),
    })
}

#[cfg(test)]
mod tests {
    use intrabar_core::Bar;

    use super::*;

    fn minute_bar(offset: i64) -> Bar {
        let timestamp = 1_735_828_200_000 + offset * 60_000;
        Bar {
            timestamp,
            datetime: ExchangeZone::NEW_YORK
                .localize_millis(timestamp)
                .expect("in range")
                .display(),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: 5,
        }
    }

    #[test]
    fn writes_coarser_series_next_to_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let symbol = Symbol::parse("SPY").expect("symbol");
        let bars: Vec<Bar> = (0..7).map(minute_bar).collect();
        write_bars(
            &series_path(dir.path(), Timeframe::OneMinute, &symbol),
            &bars,
        )
        .expect("seed source");

        let spec = AggregationSpec::new(Timeframe::OneMinute, Timeframe::ThreeMinutes)
            .expect("coarser target");
        let data = aggregate_series(dir.path(), &symbol, spec, ExchangeZone::NEW_YORK)
            .expect("aggregate");

        assert_eq!(data.input_bars, 7);
        assert_eq!(data.output_bars, 3);
        let written = read_bars(&series_path(dir.path(), Timeframe::ThreeMinutes, &symbol))
            .expect("read target");
        assert_eq!(written[0].volume, 15);
        assert_eq!(written[2].datetime, "2025-01-02 09:36:00 EST");
    }

    #[test]
    fn missing_source_series_is_a_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let symbol = Symbol::parse("QQQ").expect("symbol");
        let spec = AggregationSpec::new(Timeframe::OneMinute, Timeframe::OneHour)
            .expect("coarser target");

        let result = aggregate_series(dir.path(), &symbol, spec, ExchangeZone::NEW_YORK);
        assert!(matches!(result, Err(CliError::Storage(_))));
    }
}
