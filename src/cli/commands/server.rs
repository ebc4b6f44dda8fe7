use clap::Subcommand;

use crate::cli::utils::{print_response, ApiClient};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health (database connectivity included)")]
    Health,

    #[command(about = "Show server information from the API root endpoint")]
    Info,
}

pub async fn handle(cmd: ServerCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health => {
            let response = client.get("/health").await?;
            print_response(&output_format, &response);
            Ok(())
        }
        ServerCommands::Info => {
            let response = client.get("/").await?;
            print_response(&output_format, &response);
            Ok(())
        }
    }
}
