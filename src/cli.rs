use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a CSV instance with a planted solution
    Generate {
        /// Target in cents (6867467) or reais (68674,67 or "R$ 68.674,67")
        target: Option<String>,
        /// Number of distinct values in the pool (>= 2)
        count: Option<usize>,
        /// Output .csv file
        output: Option<String>,
        /// Instance name, defaults to custom_<COUNT>
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Solve every instance of a CSV file
    Solve {
        /// CSV file with name,pool,target columns
        path: Option<PathBuf>,
        /// Print one JSON object per instance
        #[arg(long)]
        json: bool,
        /// Number of instances solved in parallel
        #[arg(short, long, default_value_t = 1)]
        jobs: usize,
        /// Keep every K-th DP layer and replay the rest (1 keeps all, 0 picks sqrt(n))
        #[arg(short = 'k', long, default_value_t = 1)]
        checkpoint_interval: usize,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
