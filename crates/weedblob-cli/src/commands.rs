use std::fs::File;
use std::io::{self, Write};

use anyhow::Context;
use colored::Colorize;
use tracing::debug;
use weedblob_client::{open_storage, Client, StorageConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = StorageConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let client = open_storage(&config)?;
    debug!(config = %cli.config.display(), "storage ready");

    match cli.command {
        Command::Check => cmd_check(&client),
        Command::Put(args) => cmd_put(&client, args),
        Command::Get(args) => cmd_get(&client, args),
        Command::Delete(args) => cmd_delete(&client, args),
        Command::Stat(args) => cmd_stat(&client, args, cli.format),
        Command::List(args) => cmd_list(&client, args, cli.format),
    }
}

fn cmd_check(client: &Client) -> anyhow::Result<()> {
    client.check()?;
    println!("{} Master reachable", "✓".green().bold());
    Ok(())
}

fn cmd_put(client: &Client, args: PutArgs) -> anyhow::Result<()> {
    let mut file = File::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;
    let size = file.metadata()?.len();
    client.put(&args.key, size, &mut file)?;
    println!("{} Stored {} ({} bytes)", "✓".green().bold(), args.key.yellow(), size);
    Ok(())
}

fn cmd_get(client: &Client, args: GetArgs) -> anyhow::Result<()> {
    let (mut reader, size) = client.get(&args.key)?;
    match &args.output {
        Some(path) => {
            let mut out = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let copied = io::copy(&mut reader, &mut out)?;
            if copied != size {
                eprintln!(
                    "{} {} bytes read, {} recorded",
                    "warning:".yellow().bold(),
                    copied,
                    size
                );
            }
            println!("{} Wrote {} to {}", "✓".green().bold(), args.key.yellow(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            io::copy(&mut reader, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn cmd_delete(client: &Client, args: DeleteArgs) -> anyhow::Result<()> {
    client.delete(&args.key)?;
    println!("{} Deleted {}", "✓".green().bold(), args.key.yellow());
    Ok(())
}

fn cmd_stat(client: &Client, args: StatArgs, format: OutputFormat) -> anyhow::Result<()> {
    let found = client.stat_blobs(&args.keys);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&found)?),
        OutputFormat::Text => {
            for sized in &found {
                println!("{}  {}", sized.key.yellow(), sized.size);
            }
            let missing = args.keys.len() - found.len();
            if missing > 0 {
                println!("{} {} key(s) not found", "!".red().bold(), missing);
            }
        }
    }
    Ok(())
}

fn cmd_list(client: &Client, args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let page = client.list(&args.after, args.limit)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Text => {
            if page.is_empty() {
                println!("No keys.");
            }
            for blob in &page {
                println!("{}  {}  {}", blob.key.yellow(), blob.size, blob.file_id.dimmed());
            }
        }
    }
    Ok(())
}
