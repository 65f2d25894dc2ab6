//! Outlay CLI - operator tools for the Outlay backend.
//!
//! # Usage
//!
//! ```bash
//! # List backend user records
//! outlay users list
//!
//! # Upsert a user record from identity attributes
//! outlay users sync -i user_2x9f -e maria@example.com --first-name Maria
//! ```
//!
//! # Commands
//!
//! - `users list` - List backend user records
//! - `users sync` - Upsert the backend record for an identity

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "outlay")]
#[command(author, version, about = "Outlay CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and manage backend user records
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List backend user records
    List,
    /// Upsert the backend record for an identity
    Sync {
        /// Identity provider ID
        #[arg(short = 'i', long)]
        external_id: String,

        /// Primary email address
        #[arg(short, long)]
        email: String,

        /// Given name
        #[arg(long)]
        first_name: Option<String>,

        /// Family name
        #[arg(long)]
        last_name: Option<String>,

        /// Avatar URL
        #[arg(long)]
        image_url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Users { action } => match action {
            UsersAction::List => commands::users::list().await?,
            UsersAction::Sync {
                external_id,
                email,
                first_name,
                last_name,
                image_url,
            } => {
                commands::users::sync(commands::users::SyncArgs {
                    external_id,
                    email,
                    first_name,
                    last_name,
                    image_url,
                })
                .await?;
            }
        },
    }
    Ok(())
}
