use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;
mod utils;

use commands::cursor::CursorCommands;
use commands::page::PageArgs;

/// seekpage - keyset pagination over PostgreSQL tables
#[derive(Parser)]
#[command(name = "seekpage")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page of a table, or every page with --all
    Page(Box<PageArgs>),
    /// Encode and decode cursor tokens offline
    Cursor {
        #[command(subcommand)]
        command: CursorCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Page(args) => commands::page::execute(*args).await,
        Commands::Cursor { command } => commands::cursor::execute(command),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);

            if let Some(source) = e.source() {
                eprintln!("\n{} {}", "Caused by:".yellow(), source);
            }

            std::process::exit(1);
        }
    }
}
