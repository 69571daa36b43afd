use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "weedblob",
    about = "Key-addressed blob storage over SeaweedFS",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "weedblob.toml")]
    pub config: PathBuf,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Verify the SeaweedFS master is reachable
    Check,
    /// Store a file under a key
    Put(PutArgs),
    /// Fetch the content stored under a key
    Get(GetArgs),
    /// Remove a key and its content
    Delete(DeleteArgs),
    /// Show recorded sizes for keys
    Stat(StatArgs),
    /// List keys in order
    List(ListArgs),
}

#[derive(Args)]
pub struct PutArgs {
    pub key: String,
    pub file: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    pub key: String,
    /// Write content here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub key: String,
}

#[derive(Args)]
pub struct StatArgs {
    #[arg(required = true)]
    pub keys: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Start strictly after this key
    #[arg(long, default_value = "")]
    pub after: String,
    #[arg(short = 'n', long, default_value = "100")]
    pub limit: usize,
}
