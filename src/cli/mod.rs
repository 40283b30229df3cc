pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "mailshrimp-api")]
#[command(about = "MailShrimp contacts and messages API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Create database tables and indexes")]
    Migrate,

    #[command(about = "Permanently delete an account's contact by email")]
    PurgeContact {
        #[arg(long, help = "Owning account id")]
        account: i64,
        #[arg(long, help = "Contact email address")]
        email: String,
    },
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve::handle(config).await,
        Commands::Migrate => commands::migrate::handle(config).await,
        Commands::PurgeContact { account, email } => {
            commands::purge_contact::handle(config, account, &email).await
        }
    }
}
