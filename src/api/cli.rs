use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use super::{
    ConfigPayload, apply_payload, build_project_response, checked_configuration, run_http_server,
};
use crate::core::{Configuration, ProjectionCache, RatePreset, validate_configuration};
use crate::error::RunwayError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRatePreset {
    Bear,
    Base,
    Bull,
}

impl From<CliRatePreset> for RatePreset {
    fn from(value: CliRatePreset) -> Self {
        match value {
            CliRatePreset::Bear => RatePreset::Bear,
            CliRatePreset::Base => RatePreset::Base,
            CliRatePreset::Bull => RatePreset::Bull,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "btc-runway",
    about = "Deterministic BTC portfolio projection (growth, income, BTC-backed loans)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a projection and print it as JSON
    Project {
        #[command(flatten)]
        config: ConfigArgs,
        #[arg(long, help = "Refuse to project an invalid configuration")]
        strict: bool,
        #[arg(long)]
        pretty: bool,
    },
    /// Validate a configuration, exiting non-zero when it has errors
    Validate {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    #[arg(long, help = "JSON configuration file; missing fields fall back to defaults")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    time_horizon: Option<u32>,
    #[arg(long, help = "Starting BTC holdings")]
    btc_stack: Option<f64>,
    #[arg(long, help = "Starting BTC price in USD")]
    exchange_rate: Option<f64>,

    #[arg(long, help = "Savings share in percent")]
    savings: Option<f64>,
    #[arg(long, help = "Investments share in percent")]
    investments: Option<f64>,
    #[arg(long, help = "Speculation share in percent")]
    speculation: Option<f64>,

    #[arg(long)]
    investments_yield_start: Option<f64>,
    #[arg(long)]
    investments_yield_end: Option<f64>,
    #[arg(long)]
    speculation_yield_start: Option<f64>,
    #[arg(long)]
    speculation_yield_end: Option<f64>,

    #[arg(long, help = "Year income starts, 0-based")]
    activation_year: Option<u32>,
    #[arg(long, help = "Annual expenses in USD at year 0")]
    annual_expenses: Option<f64>,

    #[arg(long, help = "Flat annual BTC price growth in percent")]
    btc_price_growth: Option<f64>,
    #[arg(long, value_enum)]
    btc_price_preset: Option<CliRatePreset>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Per-year BTC price growth in percent, comma separated"
    )]
    btc_price_rates: Option<Vec<f64>>,
    #[arg(long)]
    inflation: Option<f64>,
    #[arg(long, value_delimiter = ',')]
    inflation_rates: Option<Vec<f64>>,
    #[arg(long)]
    income_growth: Option<f64>,
    #[arg(long, value_delimiter = ',')]
    income_growth_rates: Option<Vec<f64>>,

    #[arg(long, help = "Share of savings BTC pledged as loan collateral, in percent")]
    collateral_pct: Option<f64>,
    #[arg(long, help = "Loan-to-value in percent")]
    ltv: Option<f64>,
    #[arg(long, help = "Annual loan interest rate in percent")]
    loan_rate: Option<f64>,
    #[arg(long)]
    loan_term: Option<u32>,
    #[arg(long, help = "Amortize the loan instead of paying interest only")]
    amortizing: bool,

    #[arg(long, help = "Share of yield-bearing returns taken as income, in percent")]
    income_allocation_pct: Option<f64>,
    #[arg(long, help = "Rebalance buckets to the target allocation every year")]
    annual_reallocation: bool,
}

impl From<&ConfigArgs> for ConfigPayload {
    fn from(args: &ConfigArgs) -> Self {
        ConfigPayload {
            time_horizon: args.time_horizon,
            btc_stack: args.btc_stack,
            exchange_rate: args.exchange_rate,
            savings: args.savings,
            investments: args.investments,
            speculation: args.speculation,
            investments_yield_start: args.investments_yield_start,
            investments_yield_end: args.investments_yield_end,
            speculation_yield_start: args.speculation_yield_start,
            speculation_yield_end: args.speculation_yield_end,
            activation_year: args.activation_year,
            annual_expenses: args.annual_expenses,
            btc_price_growth: args.btc_price_growth,
            btc_price_preset: args.btc_price_preset.map(RatePreset::from),
            btc_price_rates: args.btc_price_rates.clone(),
            inflation: args.inflation,
            inflation_rates: args.inflation_rates.clone(),
            income_growth: args.income_growth,
            income_growth_rates: args.income_growth_rates.clone(),
            collateral_pct: args.collateral_pct,
            ltv: args.ltv,
            loan_rate: args.loan_rate,
            loan_term: args.loan_term,
            interest_only: args.amortizing.then_some(false),
            income_allocation_pct: args.income_allocation_pct,
            annual_reallocation: args.annual_reallocation.then_some(true),
            strict: None,
        }
    }
}

pub fn load_configuration(path: &Path) -> Result<Configuration, RunwayError> {
    let raw = fs::read_to_string(path).map_err(|source| RunwayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str(&raw)?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

pub fn build_configuration(args: &ConfigArgs) -> Result<Configuration, RunwayError> {
    let base = match &args.config {
        Some(path) => load_configuration(path)?,
        None => Configuration::default(),
    };
    Ok(apply_payload(base, ConfigPayload::from(args)))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), RunwayError> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

pub async fn run(cli: Cli) -> Result<(), RunwayError> {
    match cli.command {
        Command::Project {
            config,
            strict,
            pretty,
        } => {
            let config = build_configuration(&config)?;
            let (config, validation) = checked_configuration(config, strict)?;
            for warning in &validation.warnings {
                tracing::warn!("{warning}");
            }
            for error in &validation.errors {
                tracing::warn!("invalid configuration: {error}");
            }
            let mut cache = ProjectionCache::new(1);
            let response = build_project_response(&mut cache, &config, validation);
            tracing::info!(
                time_horizon = config.time_horizon,
                activation_year = config.activation_year,
                escape_velocity_year = ?response.insights.escape_velocity_year,
                "projection complete"
            );
            print_json(&response, pretty)
        }
        Command::Validate { config } => {
            let config = build_configuration(&config)?;
            let report = validate_configuration(&config);
            print_json(&report, true)?;
            if report.is_valid {
                Ok(())
            } else {
                Err(RunwayError::InvalidConfiguration(report.errors))
            }
        }
        Command::Serve { port } => run_http_server(port)
            .await
            .map_err(RunwayError::Server),
    }
}
