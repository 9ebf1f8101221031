use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hearth", about = concat!("hearth v", env!("CARGO_PKG_VERSION"), " - a touch-first dashboard for your home"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Run against a different dashboard directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<PathBuf>,

    /// Run with a simulated hub that confirms service calls after a delay
    #[arg(long, global = true)]
    pub demo: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a sample dashboard.toml
    Init,
    /// Validate the dashboard file
    Check,
    /// Show recent hub activity
    Log(LogArgs),
}

#[derive(Args)]
pub struct LogArgs {
    /// Number of lines to show
    #[arg(short = 'n', long, default_value_t = 20)]
    pub count: usize,
}
