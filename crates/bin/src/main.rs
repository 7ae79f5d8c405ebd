//! Rate case CLI binary.
//!
//! Runs the pipeline stages individually or end to end.

use clap::{Args, Parser, Subcommand};
use ratecase::{
    PipelineConfig,
    pipeline::{
        DEFAULT_BASE_YEAR, DEFAULT_FIGURES_DIR, load_analysis_ready, render_charts, run_all,
        run_etl, run_revenue_and_bill_analysis, run_statistics,
    },
};
use std::{path::PathBuf, process};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ratecase")]
#[command(about = "Utility rate case analysis: ETL, revenue requirement, bill impact", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PathArgs {
    /// Root directory holding EIA/ and FERC/ source data
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Directory for processed tables (default: <data-dir>/processed)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Directory for figures
    #[arg(long, global = true, default_value = DEFAULT_FIGURES_DIR)]
    figures_dir: PathBuf,

    /// Base year of the forecast and bill impact
    #[arg(long, global = true, default_value_t = DEFAULT_BASE_YEAR)]
    base_year: i64,
}

impl PathArgs {
    fn config(&self) -> PipelineConfig {
        let config = PipelineConfig::from_data_dir(&self.data_dir)
            .with_figures_dir(&self.figures_dir)
            .with_base_year(self.base_year);
        match &self.output_dir {
            Some(dir) => config.with_processed_dir(dir),
            None => config,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, transform and validate source data into analysis_ready.parquet
    Etl,

    /// Revenue requirement, test-year forecast and residential bill impact
    Revenue,

    /// Statistical analysis written to analysis_results.json
    Analyze,

    /// Regenerate figures from the processed tables
    Charts,

    /// Run every stage in order
    All,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run() {
        error!("{e}");
        process::exit(1);
    }
}

fn run() -> ratecase::Result<()> {
    let cli = Cli::parse();
    let config = cli.paths.config();

    match cli.command {
        Commands::Etl => {
            run_etl(&config)?;
        }
        Commands::Revenue => {
            let records = load_analysis_ready(&config)?;
            let outputs = run_revenue_and_bill_analysis(&records, &config)?;
            println!("{}", outputs.summary());
        }
        Commands::Analyze => {
            let records = load_analysis_ready(&config)?;
            let report = run_statistics(&records, &config)?;
            println!("{}", report.key_findings);
        }
        Commands::Charts => {
            for path in render_charts(&config)? {
                info!(path = %path.display(), "Figure");
            }
        }
        Commands::All => {
            let outputs = run_all(&config)?;
            println!("{}", outputs.summary());
        }
    }

    Ok(())
}
