//! Integration tests for the bank ETL run
//!
//! These tests serve a fixed page from a local HTTP server and drive the
//! whole run through real CSV, SQLite and log files.

use bank_etl::banks::{BanksExtractor, Currency, CurrencyConverter};
use bank_etl::cli::run_etl;
use bank_etl::client::PageClient;
use bank_etl::{Config, CsvTableWriter, EtlError, Pipeline, RunLog, SqliteStore};
use eyre::Result;
use rust_decimal_macros::dec;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<h2>By total assets</h2>
<table class="wikitable">
  <tr><th>Rank</th><th>Bank name</th><th>Total assets (US$ billion)</th></tr>
  <tr><td>1</td><td>Industrial and Commercial Bank of China</td><td>5,742.86</td></tr>
</table>
<h2>By market capitalization</h2>
<table class="wikitable">
  <tbody>
    <tr><th>Rank</th><th>Bank name</th><th>Market cap<br>(US$ billion)</th></tr>
    <tr><td>1</td><td><a href="/wiki/JPMorgan_Chase">JPMorgan Chase</a></td><td>432.92</td></tr>
    <tr><td>2</td><td><a href="/wiki/Bank_of_America">Bank of America</a></td><td>231.52</td></tr>
    <tr><td>3</td><td>Industrial and Commercial Bank of China<sup>[1]</sup></td><td>194.56</td></tr>
  </tbody>
</table>
</body></html>
"#;

const MALFORMED_PAGE: &str = r#"<html><body><table>
  <tr><th>Bank name</th><th>Market cap (US$ billion)</th></tr>
  <tr><td>JPMorgan Chase</td><td>432.92</td></tr>
  <tr><td>Bank of America</td><td>unknown</td></tr>
</table></body></html>
"#;

const RATES: &str = "Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n";

const EXPECTED_CSV: &str = "\
Name,MC_USD_Billion,MC_GBP_Billion,MC_EUR_Billion,MC_INR_Billion
JPMorgan Chase,432.92,346.34,402.62,35910.71
Bank of America,231.52,185.22,215.31,19204.58
Industrial and Commercial Bank of China,194.56,155.65,180.94,16138.75
";

/// Serve `body` with `status` to every connection
async fn serve(status: &'static str, body: &'static str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    Url::parse(&format!("http://{}/wiki/List_of_largest_banks", addr)).unwrap()
}

fn config_in(dir: &Path, url: &Url, rates: &str) -> Config {
    let rates_path = dir.join("exchange_rate.csv");
    std::fs::write(&rates_path, rates).unwrap();
    Config {
        url: url.to_string(),
        exchange_rates: rates_path,
        csv_output: dir.join("Largest_banks_data.csv"),
        database: dir.join("Banks.db"),
        table: "Largest_banks".to_string(),
        log_file: dir.join("code_log.txt"),
        timeout: 5,
        retries: 0,
        currency: Currency::Eur,
    }
}

async fn run(config: &Config) -> Result<bank_etl::cli::RunOutcome> {
    let log = RunLog::open(&config.log_file)?;
    run_etl(config, &log, true).await
}

#[tokio::test]
async fn test_full_run() -> Result<()> {
    let temp = TempDir::new()?;
    let url = serve("200 OK", PAGE).await;
    let config = config_in(temp.path(), &url, RATES);

    let outcome = run(&config).await?;
    assert_eq!(outcome.rows, 3);

    let csv = std::fs::read_to_string(&config.csv_output)?;
    assert_eq!(csv, EXPECTED_CSV);

    let store = SqliteStore::new(&config.database, &config.table)?;
    let stored = store.read_all()?;
    let names: Vec<&str> = stored.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "JPMorgan Chase",
            "Bank of America",
            "Industrial and Commercial Bank of China"
        ]
    );
    assert_eq!(stored[0].mc_gbp_billion, dec!(346.34));
    assert_eq!(stored[2].mc_inr_billion, dec!(16138.75));

    let report = outcome.report.expect("queries should run");
    assert_eq!(report.summary.max, Some(dec!(402.62)));
    assert_eq!(report.summary.min, Some(dec!(180.94)));
    let percents: Vec<String> = report
        .relative_sizes
        .iter()
        .map(|r| r.percent_of_largest.unwrap().to_string())
        .collect();
    assert_eq!(percents, vec!["100.00", "53.48", "44.94"]);

    let log = std::fs::read_to_string(&config.log_file)?;
    for phase in [
        "ETL Process Started",
        "Starting data extraction",
        "Data extraction completed: 3 bank(s)",
        "Data transformation completed: 3 row(s)",
        "Staged 3 row(s) in table Largest_banks",
        "Data exported to",
        "Data loaded to",
        "Running market cap summary for EUR",
        "ETL Process Completed Successfully: 3 row(s)",
    ] {
        assert!(log.contains(phase), "log should contain '{}'", phase);
    }

    Ok(())
}

#[tokio::test]
async fn test_rerun_is_idempotent() -> Result<()> {
    let temp = TempDir::new()?;
    let url = serve("200 OK", PAGE).await;
    let config = config_in(temp.path(), &url, RATES);
    let store = SqliteStore::new(&config.database, &config.table)?;

    run(&config).await?;
    let first_csv = std::fs::read(&config.csv_output)?;
    let first_table = store.read_all()?;

    run(&config).await?;
    let second_csv = std::fs::read(&config.csv_output)?;
    let second_table = store.read_all()?;

    assert_eq!(first_csv, second_csv);
    assert_eq!(first_table, second_table);
    assert_eq!(second_table.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_missing_currency_writes_nothing() -> Result<()> {
    let temp = TempDir::new()?;
    let url = serve("200 OK", PAGE).await;
    let config = config_in(temp.path(), &url, "Currency,Rate\nEUR,0.93\nGBP,0.8\n");

    let err = run(&config).await.unwrap_err();
    match EtlError::of(&err) {
        Some(EtlError::Config(msg)) => assert!(msg.contains("INR")),
        other => panic!("expected ConfigError, got {:?}", other),
    }

    assert!(!config.csv_output.exists());
    assert!(SqliteStore::new(&config.database, &config.table)?.read_all().is_err());

    let log = std::fs::read_to_string(&config.log_file)?;
    assert!(log.contains("ETL Process Failed (ConfigError)"));

    Ok(())
}

#[tokio::test]
async fn test_malformed_cell_stops_before_transform() -> Result<()> {
    let temp = TempDir::new()?;
    let url = serve("200 OK", MALFORMED_PAGE).await;
    let config = config_in(temp.path(), &url, RATES);

    let err = run(&config).await.unwrap_err();
    assert!(matches!(EtlError::of(&err), Some(EtlError::Parse(_))));
    assert!(err.to_string().contains("Bank of America"));

    assert!(!config.csv_output.exists());
    assert!(!config.database.exists());

    let log = std::fs::read_to_string(&config.log_file)?;
    assert!(!log.contains("Starting data transformation"));
    assert!(log.contains("ETL Process Failed (ParseError)"));

    Ok(())
}

#[tokio::test]
async fn test_fetch_failure_aborts() -> Result<()> {
    let temp = TempDir::new()?;
    let url = serve("404 Not Found", "").await;
    let config = config_in(temp.path(), &url, RATES);

    let err = run(&config).await.unwrap_err();
    assert!(matches!(EtlError::of(&err), Some(EtlError::Network(_))));
    assert!(!config.csv_output.exists());
    assert!(!config.database.exists());

    Ok(())
}

#[tokio::test]
async fn test_skip_queries() -> Result<()> {
    let temp = TempDir::new()?;
    let url = serve("200 OK", PAGE).await;
    let config = config_in(temp.path(), &url, RATES);

    let log = RunLog::open(&config.log_file)?;
    let outcome = run_etl(&config, &log, false).await?;
    drop(log);

    assert!(outcome.report.is_none());
    let log = std::fs::read_to_string(&config.log_file)?;
    assert!(!log.contains("Starting database queries"));

    Ok(())
}

#[tokio::test]
async fn test_pipeline_to_sqlite_only() -> Result<()> {
    let temp = TempDir::new()?;
    let url = serve("200 OK", PAGE).await;
    let config = config_in(temp.path(), &url, RATES);
    let log = RunLog::open(&config.log_file)?;

    let extractor = BanksExtractor::new(
        PageClient::try_new(Duration::from_secs(5), 0)?,
        url.clone(),
        &log,
    );
    let converter = CurrencyConverter::new(&config.exchange_rates, &log);
    let store = SqliteStore::new(&config.database, &config.table)?;

    let count = Pipeline::new(extractor, converter, store.clone()).run().await?;
    assert_eq!(count, 3);
    assert!(!config.csv_output.exists());

    let stored = store.read_all()?;
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0].name, "JPMorgan Chase");
    assert_eq!(stored[1].mc_eur_billion, dec!(215.31));

    Ok(())
}

#[tokio::test]
async fn test_pipeline_to_csv_only() -> Result<()> {
    let temp = TempDir::new()?;
    let url = serve("200 OK", PAGE).await;
    let config = config_in(temp.path(), &url, RATES);
    let log = RunLog::open(&config.log_file)?;

    let extractor = BanksExtractor::new(
        PageClient::try_new(Duration::from_secs(5), 0)?,
        url.clone(),
        &log,
    );
    let converter = CurrencyConverter::new(&config.exchange_rates, &log);
    let loader = CsvTableWriter::new(&config.csv_output);

    let count = Pipeline::new(extractor, converter, loader).run().await?;
    assert_eq!(count, 3);
    assert_eq!(std::fs::read_to_string(&config.csv_output)?, EXPECTED_CSV);

    Ok(())
}
