use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "importvet")]
#[command(about = "Import dependency analyzer and validator for Python projects", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a project's import graph
    Analyze {
        /// Project root to analyze
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to .importvet.toml discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Glob patterns to skip during discovery (comma-separated)
        #[arg(long = "ignore", value_delimiter = ',')]
        ignore: Option<Vec<String>>,

        /// Package names to treat as installed third-party dependencies
        #[arg(long = "valid-packages", value_delimiter = ',')]
        valid_packages: Option<Vec<String>>,

        /// Worker threads for per-file analysis (defaults to all cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Analyze files sequentially
        #[arg(long = "no-parallel")]
        no_parallel: bool,

        /// Exit nonzero when circular imports are found
        #[arg(long = "fail-on-cycles")]
        fail_on_cycles: bool,

        /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Initialize a configuration file in the current directory
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    Json,
    Terminal,
}

impl From<OutputFormat> for crate::io::output::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Json => crate::io::output::OutputFormat::Json,
            OutputFormat::Terminal => crate::io::output::OutputFormat::Terminal,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
