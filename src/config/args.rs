//! Command-line argument parsing for CI calculations

use clap::Parser;

/// Determinant FCI / RAS-CI calculation with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override number of states
    #[arg(long)]
    pub nstate: Option<usize>,

    /// Override number of unpaired electrons (2S)
    #[arg(long)]
    pub nspin: Option<usize>,

    /// Override molecular charge
    #[arg(long)]
    pub charge: Option<i32>,

    /// Override maximum Davidson iterations
    #[arg(long)]
    pub max_iter: Option<usize>,

    /// Override residual convergence threshold
    #[arg(long)]
    pub thresh: Option<f64>,

    /// Number of worker threads for sigma and gamma tasks
    #[arg(long)]
    pub threads: Option<usize>,

    /// Resume from (and keep writing) the restart file
    #[arg(long)]
    pub restart: bool,

    /// Compute 3- and 4-particle RDMs after convergence
    #[arg(long)]
    pub rdm34: bool,
}
