//! Fleet Backup CLI - create, list, inspect, restore and delete backups.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use fleet_backup::services::restore::working_set;
use fleet_backup::utils::{self, format_file_size};
use fleet_backup::{BackupContext, BackupId, Config};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to environment variables)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new backup
    Create {
        /// Free-form description stored with the backup
        description: Option<String>,
    },
    /// List all available backups
    List,
    /// Show detailed backup information
    Details { backup_id: String },
    /// Restore from a backup, replacing existing data
    Restore {
        backup_id: String,
        /// Comma-separated collection names (default: all)
        #[arg(long, value_delimiter = ',')]
        collections: Option<Vec<String>>,
    },
    /// Delete a backup
    Delete { backup_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    let ctx = BackupContext::from_config(&config)?;
    run(&ctx, args.command).await
}

async fn run(ctx: &BackupContext, command: Command) -> Result<()> {
    match command {
        Command::Create { description } => {
            println!("Creating backup...");
            let backup = fleet_backup::create_backup(ctx, description).await?;
            println!("Backup created");
            println!("Backup ID:   {}", backup.id);
            println!("Status:      {}", backup.status);
            println!("Size:        {}", format_file_size(backup.total_size));
            for collection in &backup.collections {
                match &collection.error {
                    None => println!("  {}: {} records", collection.name, collection.record_count),
                    Some(e) => println!("  {}: failed ({})", collection.name, e),
                }
            }
        }
        Command::List => {
            let backups = fleet_backup::list_backups(ctx).await;
            if backups.is_empty() {
                println!("No backups found.");
                return Ok(());
            }

            println!("Found {} backup(s):\n", backups.len());
            for backup in backups {
                println!("ID:          {}", backup.id);
                println!("Date:        {}", backup.timestamp.to_rfc3339());
                println!("Status:      {}", backup.status);
                println!("Collections: {}", backup.collections.join(", "));
                println!("{}", "-".repeat(50));
            }
        }
        Command::Details { backup_id } => {
            let id = BackupId::parse(backup_id.trim())?;
            let Some(details) = fleet_backup::get_backup_details(ctx, &id).await else {
                bail!("Backup not found: {}", id);
            };

            println!("ID:          {}", details.id);
            println!("Created:     {}", details.timestamp.to_rfc3339());
            println!("Status:      {}", details.status);
            println!("Total Size:  {}", format_file_size(details.total_size));
            if let Some(description) = &details.description {
                println!("Description: {}", description);
            }
            println!("\nCollections:");
            for collection in &details.collections {
                println!(
                    "  {}: {} records ({}) - {:?}",
                    collection.name,
                    collection.record_count,
                    format_file_size(collection.file_size),
                    collection.status
                );
                if let Some(e) = &collection.error {
                    println!("    Error: {}", e);
                }
            }
        }
        Command::Restore {
            backup_id,
            collections,
        } => {
            let id = BackupId::parse(backup_id.trim())?;
            let selected = collections.as_deref();
            println!("Backup ID:   {}", id);
            println!("Collections: {}", working_set(ctx, selected).join(", "));
            println!("WARNING: this replaces existing data");

            fleet_backup::restore_from_backup(ctx, &id, selected).await?;
            println!("Restore completed");
        }
        Command::Delete { backup_id } => {
            let id = BackupId::parse(backup_id.trim())?;
            let removed = fleet_backup::delete_backup(ctx, &id).await?;
            println!("Backup {} deleted ({} objects)", id, removed);
        }
    }
    Ok(())
}
