use clap::Parser;
use std::path::PathBuf;

/// Apply an editing script to a model and print the result.
#[derive(Parser, Debug)]
#[command(name = "modeler")]
#[command(about = "Runs relation-consistent editing scripts against a model snapshot")]
pub struct Args {
    /// Editing script: a JSON list of commands
    pub script: PathBuf,

    /// Model snapshot to start from (JSON); an empty model when omitted
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Engine configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the relations of every node instead of the full model
    #[arg(long)]
    pub relations: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}
