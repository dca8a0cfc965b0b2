use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gridstat",
    about = "Descriptive statistics over large datasets via data-parallel kernel dispatch",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute statistics (mean, min/max, variance, quartiles) for a dataset
    Analyze {
        /// Dataset file (whitespace-delimited; last column holds the value)
        file: PathBuf,

        /// Compute device: auto, threaded or cpu
        #[arg(long, default_value = "auto")]
        device: String,

        /// Override the device's maximum work-group size
        #[arg(long)]
        group_limit: Option<usize>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// List available compute devices
    ListDevices,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            file,
            device,
            group_limit,
            json,
        } => {
            tracing::info!(file = %file.display(), %device, "Analyzing dataset");
            let device = gridstat::select_device(&device, group_limit)?;
            let summary = gridstat::analyze_file(&file, device.as_ref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("\ngridstat -- {} values", summary.count);
                println!("{:<20} : {:.6}", "Mean", summary.mean);
                println!("{:<20} : {:.6}", "Minimum", summary.minimum);
                println!("{:<20} : {:.6}", "Maximum", summary.maximum);
                println!("{:<20} : {:.6}", "Variance", summary.variance);
                println!("{:<20} : {:.6}", "Standard deviation", summary.std_dev);
                println!("{:<20} : {:.1}", "25th percentile", summary.p25);
                println!("{:<20} : {:.1}", "Median", summary.median);
                println!("{:<20} : {:.1}", "75th percentile", summary.p75);
                println!("{:<20} : {} us", "Elapsed", summary.duration_us);
                println!();
            }
        }
        Commands::ListDevices => {
            println!("{:<12} | Max work-group size", "Device");
            println!("{:-<12}-|-{:-<20}", "", "");
            for (name, limit) in gridstat::accel::available_devices() {
                println!("{:<12} | {}", name, limit);
            }
        }
    }

    Ok(())
}
