//! Roster CLI binary.
//!
//! Computes daily percentage-change returns for the companies that stayed in
//! an index for a whole date window.

mod integration;

use clap::{Args, Parser, Subcommand};
use integration::outputs::{OutputPaths, write_outputs};
use integration::progress_bar::BarProgress;
use roster::{
    DateWindow, MembershipTable, Pipeline, PipelineConfig, PipelineOutput, common_constituents,
};
use roster_data::{AssetClass, Country, YahooProvider, read_membership_csv};
use roster_output::ExportFormat;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Rows of the returns table shown after a run.
const PREVIEW_ROWS: usize = 10;

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Roster: daily returns of long-standing index constituents", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve constituents and fetch their daily returns
    Run(RunArgs),

    /// Print the number of months in a window
    Months(WindowArgs),

    /// List the companies present in every month of a window
    Common {
        /// Membership CSV with Date and Company columns
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Args)]
struct WindowArgs {
    /// Window start (YYYY-MM-DD)
    #[arg(long)]
    start: String,

    /// Window end (YYYY-MM-DD), normally the last day of a month
    #[arg(long)]
    end: String,
}

impl WindowArgs {
    fn window(&self) -> roster::Result<DateWindow> {
        let window = DateWindow::parse(&self.start, &self.end)?;
        if !window.ends_on_month_end() {
            warn!(
                end = %window.end(),
                "Window does not end on a month end; the final partial month still counts"
            );
        }
        Ok(window)
    }
}

#[derive(Args)]
struct RunArgs {
    /// Membership CSV with Date and Company columns
    #[arg(long)]
    input: PathBuf,

    /// Returns table destination
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    window: WindowArgs,

    /// Country whose listings are searched
    #[arg(long, default_value = "united kingdom")]
    country: String,

    /// Membership records per matcher batch
    #[arg(long, default_value = "100")]
    batch_size: usize,

    /// Maximum external calls in flight
    #[arg(long, default_value = "1")]
    concurrency: usize,

    /// Limit for each external call, in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Minimum interval between Yahoo requests, in milliseconds
    #[arg(long, default_value = "500")]
    rate_limit_ms: u64,

    /// Write resolution errors to this CSV file
    #[arg(long)]
    errors_output: Option<PathBuf>,

    /// Write skipped symbols to this CSV file
    #[arg(long)]
    skipped_output: Option<PathBuf>,

    /// Returns table format (csv, json or pretty-json)
    #[arg(long, default_value = "csv")]
    format: String,
}

impl RunArgs {
    fn config(&self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        Ok(PipelineConfig {
            country: self.country.parse::<Country>()?,
            asset_class: AssetClass::Equity,
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            call_timeout: Duration::from_secs(self.timeout_secs),
        })
    }

    fn paths(&self) -> OutputPaths {
        OutputPaths {
            returns: self.output.clone(),
            errors: self.errors_output.clone(),
            skipped: self.skipped_output.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("roster=debug,roster_data=debug,roster_output=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("roster=info,roster_data=info,roster_output=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run(args) => run_pipeline(&args).await?,
        Commands::Months(args) => {
            let window = args.window()?;
            println!("{}", window.months());
        }
        Commands::Common { input, window } => {
            let window = window.window()?;
            let table = MembershipTable::new(read_membership_csv(&input)?);
            for company in common_constituents(&table, &window) {
                println!("{company}");
            }
        }
    }

    Ok(())
}

async fn run_pipeline(args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let window = args.window.window()?;
    let config = args.config()?;
    let format: ExportFormat = args.format.parse()?;

    let table = MembershipTable::new(read_membership_csv(&args.input)?);
    let source = YahooProvider::with_rate_limit(Duration::from_millis(args.rate_limit_ms))?;

    info!(
        country = %config.country,
        concurrency = config.concurrency,
        timeout_secs = args.timeout_secs,
        "Using Yahoo Finance"
    );

    let progress = BarProgress::new();
    let output = Pipeline::new(&source, config)
        .run(&table, window, &progress)
        .await;

    write_outputs(&output, &args.paths(), format)?;
    print_summary(&output)?;

    Ok(())
}

fn print_summary(output: &PipelineOutput) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{}", output.report());

    if !output.resolution.errors.is_empty() {
        println!("\nUnresolved companies:");
        for error in &output.resolution.errors {
            println!("  {}: {}", error.company, error.reason);
        }
    }

    if !output.skipped.is_empty() {
        println!("\nSkipped symbols:");
        for skipped in &output.skipped {
            println!("  {}: {}", skipped.symbol, skipped.reason);
        }
    }

    if !output.returns.is_empty() {
        let preview = output.returns.to_frame()?.head(Some(PREVIEW_ROWS));
        println!("\n{preview}");
    }

    Ok(())
}
