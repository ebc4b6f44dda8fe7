use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{print_response, ApiClient};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ShareCommands {
    #[command(about = "List current access grants")]
    List,

    #[command(about = "Grant delegated access to an email")]
    Grant {
        #[arg(help = "Delegate email address")]
        email: String,
        #[arg(long, default_value = "read", help = "Access level: read, write, or admin")]
        level: String,
    },

    #[command(about = "Revoke delegated access from an email")]
    Revoke {
        #[arg(help = "Delegate email address")]
        email: String,
    },
}

pub async fn handle(cmd: ShareCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ShareCommands::List => {
            let response = client.get("/api/sharing/grants").await?;
            print_response(&output_format, &response);
            Ok(())
        }
        ShareCommands::Grant { email, level } => {
            let response = client
                .post("/api/sharing/grants", json!({ "email": email, "access_level": level }))
                .await?;
            print_response(&output_format, &response);
            Ok(())
        }
        ShareCommands::Revoke { email } => {
            let response = client
                .delete("/api/sharing/grants", json!({ "email": email }))
                .await?;
            print_response(&output_format, &response);
            Ok(())
        }
    }
}
