use bank_etl::banks::Currency;
use bank_etl::cli::{format_report, read_log, run_etl};
use bank_etl::config::Config;
use bank_etl::run_log::RunLog;
use clap::{Parser, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Extract the largest banks by market cap, convert to GBP/EUR/INR and load to CSV and SQLite
#[derive(Parser)]
#[command(name = "bank-etl", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source BANK_ETL_* settings from, if it exists
    #[arg(short, long, default_value = ".env")]
    env: String,

    /// YAML config file (defaults to bank-etl.yml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page holding the market cap table
    #[arg(long)]
    url: Option<String>,

    /// Exchange rate CSV with Currency and Rate columns
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Output CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Output SQLite database
    #[arg(long)]
    db: Option<PathBuf>,

    /// Table name inside the database
    #[arg(long)]
    table: Option<String>,

    /// Progress log file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Currency column for the summary and size comparison queries
    #[arg(long)]
    currency: Option<Currency>,

    /// Load only, skip the analytical queries
    #[arg(long)]
    skip_queries: bool,

    /// Print query results as JSON
    #[arg(long)]
    json: bool,

    /// Print the progress log after the run
    #[arg(long)]
    print_log: bool,

    /// More verbose console logging
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(rates) = &self.rates {
            config.exchange_rates = rates.clone();
        }
        if let Some(csv) = &self.csv {
            config.csv_output = csv.clone();
        }
        if let Some(db) = &self.db {
            config.database = db.clone();
        }
        if let Some(table) = &self.table {
            config.table = table.clone();
        }
        if let Some(log) = &self.log {
            config.log_file = log.clone();
        }
        if let Some(currency) = self.currency {
            config.currency = currency;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if Path::new(&cli.env).exists() {
        dotenvy::from_filename(&cli.env)?;
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    log::info!(
        "Loading {} into {} and {}",
        config.url.bright_black(),
        config.csv_output.display().bright_black(),
        config.database.display().bright_black()
    );

    let outcome = {
        let run_log = RunLog::open(&config.log_file)?;
        run_etl(&config, &run_log, !cli.skip_queries).await
    };

    // Print the log even when the run failed; the error is reported last
    if cli.print_log {
        println!("\n{}", "Log file contents:".bold());
        print!("{}", read_log(&config.log_file)?);
    }

    let outcome = outcome?;
    log::info!("✓ Loaded {} bank(s)", outcome.rows.cyan());

    if let Some(report) = &outcome.report {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(report)?);
        } else {
            for (title, body) in format_report(report) {
                println!("\n{}", title.bold().green());
                print!("{}", body);
            }
        }
    }

    Ok(())
}
