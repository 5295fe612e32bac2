//! The `report-app` command line.

use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use tracing::{info, warn};

use std::{ffi::OsString, io::Write, num::NonZeroUsize};

use crate::{
    config::Settings,
    format::{write_report, OutputFormat},
    report::ReportService,
};

/// Prints product reports from the Northwind catalog.
#[derive(Debug, Parser)]
#[command(name = "report-app", version)]
pub struct Cli {
    /// Report to print
    #[arg(value_enum, ignore_case = true)]
    pub report: Option<ReportKind>,

    /// Number of products to show (most-expensive-products only)
    pub count: Option<NonZeroUsize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    /// Show current products with catalog prices only
    #[arg(long)]
    pub no_local_prices: bool,

    #[command(flatten)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Shows current products
    CurrentProducts,
    /// Shows specified number of the most expensive products
    MostExpensiveProducts,
}

/// A fully specified report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    CurrentProducts { local_prices: bool },
    MostExpensiveProducts(NonZeroUsize),
}

impl Cli {
    /// Returns the report to run, or `None` if the arguments don't name a
    /// complete one.
    #[must_use]
    pub fn invocation(&self) -> Option<Invocation> {
        match self.report? {
            ReportKind::CurrentProducts => Some(Invocation::CurrentProducts {
                local_prices: !self.no_local_prices,
            }),
            ReportKind::MostExpensiveProducts => {
                self.count.map(Invocation::MostExpensiveProducts)
            }
        }
    }
}

/// Parses `args` and prints the requested report to `out`.
///
/// Arguments that don't describe a report print the usage help instead,
/// without contacting any service.
///
/// # Errors
///
/// Returns any error from building or writing the report.
pub async fn run<I, T>(args: I, out: &mut impl Write) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            write!(out, "{}", e.render())?;
            return Ok(());
        }
        Err(e) => {
            warn!("bad arguments: {e}");
            return write_usage(out);
        }
    };
    let Some(invocation) = cli.invocation() else {
        return write_usage(out);
    };
    let settings = &cli.settings;
    let client = settings.http_client()?;
    let service = ReportService::new(settings.catalog(client.clone()));
    info!(?invocation, "building report");
    match invocation {
        Invocation::MostExpensiveProducts(count) => {
            let report = service
                .most_expensive_products(count.get())
                .await
                .context("building the most expensive products report")?;
            let header = format!("{count} most expensive products:");
            write_report(out, cli.format, &header, &report)?;
        }
        Invocation::CurrentProducts { local_prices: true } => {
            let rates = settings.exchange_rates(client.clone())?;
            let countries = settings.country_currency(client);
            let report = service
                .current_products_with_local_currency(&countries, &rates)
                .await
                .context("building the current products report")?;
            write_report(out, cli.format, "current products:", &report)?;
        }
        Invocation::CurrentProducts { local_prices: false } => {
            let report = service
                .current_products()
                .await
                .context("building the current products report")?;
            write_report(out, cli.format, "current products:", &report)?;
        }
    }
    Ok(())
}

fn write_usage(out: &mut impl Write) -> Result<()> {
    write!(out, "{}", Cli::command().render_help())?;
    Ok(())
}
