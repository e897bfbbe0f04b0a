use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pore-qc", version, about = "QC summary tables for nanopore sequencing runs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Run(RunArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to a sequencing_summary.txt, plain or gzipped
    pub summary: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    /// Run id to analyse; defaults to the run with the most reads
    #[arg(long)]
    pub run_id: Option<String>,

    #[arg(long)]
    pub sample_name: Option<String>,

    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// Time window size in hours
    #[arg(long, default_value_t = 0.25)]
    pub time_window: f64,

    /// Read length bin size in base pairs
    #[arg(long, default_value_t = 1000.0)]
    pub length_bin: f64,

    /// Mean qscore bin size
    #[arg(long, default_value_t = 0.1)]
    pub qscore_bin: f64,

    /// Logarithmic read length bins
    #[arg(long, default_value_t = false)]
    pub length_log: bool,

    /// Report distribution frequencies alongside counts
    #[arg(long, default_value_t = false)]
    pub normalized: bool,
}
