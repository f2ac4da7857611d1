//! CLI helper functions

use crate::{
    analytics::AnalyticsReport,
    banks::{BanksExtractor, BanksLoader, CurrencyConverter},
    client::PageClient,
    config::Config,
    error::EtlError,
    etl::Pipeline,
    run_log::RunLog,
    storage::{CsvTableWriter, SqliteStore},
};
use eyre::Result;
use rust_decimal::Decimal;
use std::fmt::Write;
use std::path::Path;

/// What a successful run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub rows: usize,
    pub report: Option<AnalyticsReport>,
}

/// Run the whole job and record its outcome in the run log
///
/// Pipeline: BanksExtractor → CurrencyConverter → BanksLoader, then the
/// analytical queries unless `run_queries` is false.
pub async fn run_etl(config: &Config, log: &RunLog, run_queries: bool) -> Result<RunOutcome> {
    log.info("ETL Process Started");

    match run_stages(config, log, run_queries).await {
        Ok(outcome) => {
            log.info(format!(
                "ETL Process Completed Successfully: {} row(s)",
                outcome.rows
            ));
            Ok(outcome)
        }
        Err(e) => {
            match EtlError::of(&e) {
                Some(typed) => log.error(format!("ETL Process Failed ({}): {}", typed.kind(), e)),
                None => log.error(format!("ETL Process Failed: {}", e)),
            }
            Err(e)
        }
    }
}

async fn run_stages(config: &Config, log: &RunLog, run_queries: bool) -> Result<RunOutcome> {
    config.validate()?;
    let url = config.source_url()?;
    let client = PageClient::try_new(config.request_timeout(), config.retries)?;
    let store = SqliteStore::new(&config.database, &config.table)?;

    let extractor = BanksExtractor::new(client, url, log);
    let converter = CurrencyConverter::new(&config.exchange_rates, log);
    let loader = BanksLoader::new(CsvTableWriter::new(&config.csv_output), store.clone(), log);

    let pipeline = Pipeline::new(extractor, converter, loader);
    let rows = pipeline.run().await?;

    let report = match run_queries {
        true => Some(AnalyticsReport::run(&store, config.currency, log)?),
        false => None,
    };

    Ok(RunOutcome { rows, report })
}

/// Read back the run log for display
pub fn read_log(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .map_err(|e| EtlError::io(format!("Failed to read log file {}", path.display()), e).into())
}

/// Plain-text rendering of the query results, one section per query
pub fn format_report(report: &AnalyticsReport) -> Vec<(String, String)> {
    let summary = &report.summary;
    let mut market_cap = String::new();
    let _ = writeln!(
        market_cap,
        "{:<12} {:>12}\n{:<12} {:>12}\n{:<12} {:>12}\n{:<12} {:>12}",
        format!("Average_MC_{}", summary.currency),
        show(summary.average),
        format!("Max_MC_{}", summary.currency),
        show(summary.max),
        format!("Min_MC_{}", summary.currency),
        show(summary.min),
        "Max_to_Min_Ratio",
        show(summary.max_to_min_ratio),
    );

    let mut averages = String::new();
    for currency in crate::banks::Currency::ALL {
        let _ = writeln!(
            averages,
            "{:<12} {:>12}",
            format!("Avg_{}", currency),
            show(report.averages.get(currency))
        );
    }

    let mut sizes = String::new();
    let _ = writeln!(
        sizes,
        "{:<45} {:>14} {:>18}",
        "Name",
        summary.currency.column(),
        "Percent_of_Largest"
    );
    for row in &report.relative_sizes {
        let _ = writeln!(
            sizes,
            "{:<45} {:>14} {:>18}",
            row.name,
            row.market_cap.to_string(),
            show(row.percent_of_largest)
        );
    }

    vec![
        ("Market Cap Analysis".to_string(), market_cap),
        ("Average by Currency".to_string(), averages),
        ("Bank Size Comparison".to_string(), sizes),
    ]
}

fn show(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
