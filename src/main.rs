//! Sippy component-readiness CLI.
//!
//! Fetches report data from a Sippy backend and renders it as terminal
//! tables. Ctrl+C while a request is in flight cancels it cleanly rather
//! than failing the run.

use std::io::{self, Write};

use anyhow::{bail, Result};
use clap::Parser;
use sippy::cli::{Cli, Commands, ReportArgs};
use sippy::client::{Client, ReportFetcher};
use sippy::config::{Config, DEFAULT_API_BASE};
use sippy::dimensions::DimensionTable;
use sippy::query;
use sippy::render;
use sippy::report::{column_labels, is_terminal_label, ReportState};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let api_base = config.api_base(cli.api_url.as_deref());
    let table = DimensionTable::builtin()?;

    match cli.command {
        Commands::Report(args) => run_report(&api_base, &args, &table, &config).await,
        Commands::Url(args) => {
            println!("{}", compose_url(&api_base, &args, &table, &config));
            Ok(())
        }
        Commands::Expand { environment } => {
            println!("{}", table.expand_environment(&environment));
            Ok(())
        }
        Commands::Config => {
            print_config(&api_base);
            Ok(())
        }
    }
}

/// Pick the endpoint for the requested drill level and compose its URL.
fn compose_url(api_base: &str, args: &ReportArgs, table: &DimensionTable, config: &Config) -> String {
    let filter = args.to_filter(config);
    let environment = args.environment.as_deref();
    match (&args.component, &args.capability, &args.test_id) {
        (Some(component), Some(capability), Some(test_id)) => query::test_details_url(
            api_base, &filter, component, capability, test_id, environment, table,
        ),
        (Some(component), Some(capability), None) => {
            query::capability_tests_url(api_base, &filter, component, capability)
        }
        (Some(component), None, _) => {
            query::capabilities_url(api_base, &filter, component, environment, table)
        }
        _ => query::main_report_url(api_base, &filter),
    }
}

async fn run_report(
    api_base: &str,
    args: &ReportArgs,
    table: &DimensionTable,
    config: &Config,
) -> Result<()> {
    let url = compose_url(api_base, args, table, config);
    let fetcher = ReportFetcher::new(Client::new());

    // Ctrl+C aborts the in-flight request; the fetch resolves into the
    // cancelled outcome instead of an error.
    let lifecycle = fetcher.lifecycle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            lifecycle.cancel();
        }
    });

    eprintln!("fetching: {url}");
    match fetcher.fetch(&url).await {
        ReportState::Ready(report) => {
            let labels = column_labels(Some(&report));
            if labels.first().is_some_and(|label| is_terminal_label(label)) {
                println!("No data for this report; adjust filters and retry.");
                return Ok(());
            }
            print!("{}", render::render_table(&report, &labels));
            println!();
            print!("{}", render::legend());
            io::stdout().flush()?;
            Ok(())
        }
        ReportState::Empty => {
            println!("No data for this report; adjust filters and retry.");
            Ok(())
        }
        ReportState::Cancelled => {
            println!("Operation cancelled.");
            Ok(())
        }
        ReportState::Failed(message) => bail!(
            "Failed to load component readiness data\n{message}\n\
             Check, and possibly fix api server, then retry"
        ),
        ReportState::Loading => bail!("report request did not complete"),
    }
}

fn print_config(api_base: &str) {
    println!("Settings path: {}", Config::settings_path().display());
    println!();
    println!("API origin precedence:");
    println!("  1) --api-url flag");
    println!("  2) SIPPY_API_URL environment variable");
    println!("  3) api_url in settings file");
    println!("  4) Built-in default ({DEFAULT_API_BASE})");
    println!();
    println!("Resolved origin: {api_base}");
}
