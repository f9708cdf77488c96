use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "order-bench")]
#[command(about = "Catalog/order latency sweep", long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for result files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Base URL of the service under test
    #[arg(short, long)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print mean latencies from existing result files
    Summary,
}
