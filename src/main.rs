// src/main.rs

use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use ponto_dashboard::loader::{DEFAULT_CACHE_TTL_SECS, DEFAULT_HTTP_TIMEOUT_SECS};
use ponto_dashboard::{DashboardReport, DataSource, LoaderConfig, RecordFilter, ReportLoader};

const BASE_URL_ENV: &str = "PONTO_BASE_URL";

/// Text dashboard over the attendance occurrences and hour-bank tables.
#[derive(Parser, Debug)]
#[command(name = "ponto-dashboard", version)]
struct Cli {
    /// Attendance occurrences table: local path, full URL, or a file
    /// suffix resolved against the base URL when one is configured.
    #[arg(long, default_value = "Relatorio_OcorrenciasNoPonto.csv")]
    attendance: String,

    /// Hour-bank ledger table, same resolution rules.
    #[arg(long, default_value = "Relatorio_ContaCorrenteBancoDeHorasResumo.csv")]
    ledger: String,

    /// Base URL for remote fetches. Falls back to PONTO_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Sheet/tab name for the attendance workbook (remote sources only).
    #[arg(long)]
    attendance_sheet: Option<String>,

    /// Sheet/tab name for the ledger workbook (remote sources only).
    #[arg(long)]
    ledger_sheet: Option<String>,

    /// Rows per ranking section.
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Restrict the report to these establishments (repeatable).
    #[arg(long = "establishment")]
    establishments: Vec<String>,

    /// Restrict the report to these departments (repeatable).
    #[arg(long = "department")]
    departments: Vec<String>,

    /// Seconds a loaded table stays cached before a re-fetch.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    cache_ttl_secs: u64,

    /// Timeout for remote fetches, in seconds.
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    http_timeout_secs: u64,
}

fn resolve_source(arg: &str, base: Option<&Url>, sheet: Option<String>) -> Result<DataSource> {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        let url = Url::parse(arg).with_context(|| format!("invalid source URL '{arg}'"))?;
        return Ok(DataSource::Remote { url, sheet });
    }
    if let Some(base) = base {
        let source = DataSource::remote(base, arg, sheet)
            .with_context(|| format!("resolving '{arg}' against the base URL"))?;
        return Ok(source);
    }
    Ok(DataSource::File(PathBuf::from(arg)))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let base_url = match cli.base_url.clone().or_else(|| env::var(BASE_URL_ENV).ok()) {
        Some(raw) => {
            Some(Url::parse(&raw).with_context(|| format!("invalid base URL '{raw}'"))?)
        }
        None => None,
    };

    let config = LoaderConfig {
        http_timeout: Duration::from_secs(cli.http_timeout_secs),
        cache_ttl: Duration::from_secs(cli.cache_ttl_secs),
    };
    let loader = ReportLoader::new(&config)?;

    let attendance_source =
        resolve_source(&cli.attendance, base_url.as_ref(), cli.attendance_sheet.clone())?;
    let ledger_source = resolve_source(&cli.ledger, base_url.as_ref(), cli.ledger_sheet.clone())?;

    info!(attendance = %attendance_source, ledger = %ledger_source, "loading report tables");

    let attendance = loader
        .load_attendance(&attendance_source)
        .await
        .with_context(|| format!("loading attendance table from {attendance_source}"))?;
    let ledger = loader
        .load_ledger(&ledger_source)
        .await
        .with_context(|| format!("loading ledger table from {ledger_source}"))?;

    let filter = RecordFilter {
        establishments: cli.establishments.clone(),
        departments: cli.departments.clone(),
    };

    let report = if filter.is_unrestricted() {
        DashboardReport::build(attendance.as_slice(), ledger.as_slice(), cli.top)
    } else {
        let attendance = filter.filter_attendance(attendance.as_slice());
        let ledger = filter.filter_ledger(ledger.as_slice());
        DashboardReport::build(&attendance, &ledger, cli.top)
    };

    println!("{report}");
    Ok(())
}
