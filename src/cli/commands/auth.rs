use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{print_response, ApiClient};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Register a new user")]
    Register {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password")]
        password: String,
    },

    #[command(about = "Login and print a bearer token")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password")]
        password: String,
    },

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Register { email, password } => {
            let response = client
                .post("/auth/register", json!({ "email": email, "password": password }))
                .await?;
            print_response(&output_format, &response);
            Ok(())
        }
        AuthCommands::Login { email, password } => {
            let response = client
                .post("/auth/login", json!({ "email": email, "password": password }))
                .await?;
            print_response(&output_format, &response);
            Ok(())
        }
        AuthCommands::Whoami => {
            let response = client.get("/api/auth/whoami").await?;
            print_response(&output_format, &response);
            Ok(())
        }
    }
}
