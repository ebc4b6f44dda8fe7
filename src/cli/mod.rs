pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use utils::ApiClient;

#[derive(Parser)]
#[command(name = "atrium")]
#[command(about = "Atrium CLI - Command-line interface for the dashboard API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Server base URL (or ATRIUM_SERVER_URL)")]
    pub server: Option<String>,

    #[arg(long, global = true, help = "Bearer token for protected calls (or ATRIUM_TOKEN)")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Server status and information")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Authentication and token management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Delegated access management (primary owner only)")]
    Share {
        #[command(subcommand)]
        cmd: commands::share::ShareCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let base_url = cli
        .server
        .clone()
        .or_else(|| std::env::var("ATRIUM_SERVER_URL").ok())
        .unwrap_or_else(|| "http://localhost:3000".to_string());
    let token = cli.token.clone().or_else(|| std::env::var("ATRIUM_TOKEN").ok());
    let client = ApiClient::new(base_url, token);

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, &client, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, &client, output_format).await,
        Commands::Share { cmd } => commands::share::handle(cmd, &client, output_format).await,
    }
}
