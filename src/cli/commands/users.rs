use clap::Subcommand;
use serde_json::json;

use crate::auth::Role;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::models::User;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Grant the admin role to an account")]
    Promote {
        #[arg(help = "Account email")]
        email: String,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;

    match cmd {
        UserCommands::Promote { email } => {
            if !User::set_role(&pool, &email, Role::Admin).await? {
                output_error(&output_format, &format!("No account with email '{}'", email), Some("NOT_FOUND"))?;
                anyhow::bail!("No account with email '{}'", email);
            }
            // Existing sessions keep their old role claim until they expire or are revoked
            output_success(
                &output_format,
                &format!("{} is now an admin", email),
                Some(json!({ "email": email, "role": Role::Admin })),
            )
        }
    }
}
