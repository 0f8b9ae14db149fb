use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for csv-visor
#[derive(Parser, Debug)]
#[command(version, about = "View, filter and scatter-plot CSV files")]
pub struct Args {
    /// CSV file to open on start-up
    pub path: Option<PathBuf>,

    /// JSON config file (defaults to ./csv_visor.json when present)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Emitter reference label file (`name=id` per line)
    #[arg(long = "reference")]
    pub reference: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long = "debug", action)]
    pub debug: bool,
}
