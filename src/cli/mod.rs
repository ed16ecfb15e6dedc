//! CLI command definitions and parsing
use crate::probfuse::Policy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "probfuse",
    version,
    about = "Fuse ranked retrieval runs with CombSUM-family operators and ProbFuse",
    long_about = "probfuse combines the ranked result lists of several retrieval models for a fixed \
                  topic set. It runs the six classical score combination operators and the \
                  probabilistic, segment-based ProbFuse method, writing TREC-style runs for an \
                  external evaluator."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/probfuse/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile to apply (e.g., "quick")
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the six score combination operators over all runs
    Combine {
        /// Directory containing run1 .. runN (overrides config)
        #[arg(long)]
        runs_dir: Option<PathBuf>,

        /// Output directory for the fused runs (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Label every retrieved document as relevant, not relevant or unjudged
    Judge {
        /// Directory containing run1 .. runN (overrides config)
        #[arg(long)]
        runs_dir: Option<PathBuf>,

        /// Judgment file (overrides config)
        #[arg(long)]
        qrels: Option<PathBuf>,

        /// Output directory for preprocessed files (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Train and score every ProbFuse configuration in the grid
    Fuse {
        /// Directory with <run>_preprocessed.txt files (overrides config)
        #[arg(long)]
        judged_dir: Option<PathBuf>,

        /// Output directory for ProbFuse runs (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Segment counts, comma separated
        #[arg(short = 'x', long, value_delimiter = ',')]
        segments: Option<Vec<usize>>,

        /// Training fractions, comma separated
        #[arg(short = 't', long, value_delimiter = ',')]
        fractions: Option<Vec<f64>>,

        /// Restrict to one estimation policy
        #[arg(long, value_parser = parse_policy)]
        policy: Option<Policy>,

        /// Base random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Report MAP for every evaluated run and the best configuration
    Best {
        /// Directory tree containing <name>_eval.txt files
        evals_dir: PathBuf,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

fn parse_policy(value: &str) -> Result<Policy, String> {
    value.parse().map_err(|e: crate::error::FusionError| e.to_string())
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
