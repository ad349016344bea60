use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use curator_observability::LogFormat;

/// Reconcile a product catalog with an inventory ledger and export a curated subset.
#[derive(Debug, Parser)]
#[command(name = "curator", version, about)]
pub struct Cli {
    /// Log output format (`pretty` or `json`); filtering comes from RUST_LOG.
    #[arg(long, env = "CURATOR_LOG_FORMAT", default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Files making up one upload cycle.
#[derive(Debug, Clone, Args)]
pub struct Inputs {
    /// Product CSV file; repeat to concatenate several files.
    #[arg(long = "products", value_name = "FILE", required = true)]
    pub products: Vec<PathBuf>,

    /// Inventory CSV file.
    #[arg(long, value_name = "FILE")]
    pub inventory: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Output {
    /// Directory the export files are written to.
    #[arg(long, value_name = "DIR", env = "CURATOR_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print every product group with its stocked variants.
    Browse {
        #[command(flatten)]
        inputs: Inputs,

        /// Print the groups as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Select handles and write the two export files.
    Export {
        #[command(flatten)]
        inputs: Inputs,

        /// Handle to include; repeat for several products.
        #[arg(long = "select", value_name = "HANDLE")]
        select: Vec<String>,

        #[command(flatten)]
        output: Output,
    },

    /// Curate interactively: toggle handles and export from a prompt on stdin.
    Interactive {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        output: Output,
    },
}
