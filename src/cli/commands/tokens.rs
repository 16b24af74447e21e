use clap::Subcommand;
use serde_json::json;

use crate::auth::UserId;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::{PgTokenStore, TokenStore};

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "List active sessions of a user")]
    List {
        #[arg(help = "User ID")]
        user_id: UserId,
    },

    #[command(about = "Revoke every session of a user")]
    Revoke {
        #[arg(help = "User ID")]
        user_id: UserId,
    },

    #[command(about = "Delete expired and revoked session rows")]
    Purge,
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = PgTokenStore::new(connect().await?);

    match cmd {
        TokenCommands::List { user_id } => {
            let tokens = store.list_active_for_user(user_id).await?;

            if tokens.is_empty() {
                return output_empty_collection(&output_format, "tokens", "No active sessions");
            }

            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({ "userId": user_id, "tokens": tokens }))?
                    );
                }
                OutputFormat::Text => {
                    println!("{:<8} {:<17} {:<17} {:<17} {:<16} {}", "ID", "CREATED", "LAST USED", "EXPIRES", "IP", "DEVICE");
                    println!("{}", "-".repeat(100));

                    for token in &tokens {
                        println!(
                            "{:<8} {:<17} {:<17} {:<17} {:<16} {}",
                            token.id,
                            token.created_at.format("%Y-%m-%d %H:%M"),
                            token.last_used_at.format("%Y-%m-%d %H:%M"),
                            token.expires_at.format("%Y-%m-%d %H:%M"),
                            token.ip_address.as_deref().unwrap_or("-"),
                            token.device_info.as_deref().unwrap_or("-"),
                        );
                    }
                }
            }
            Ok(())
        }
        TokenCommands::Revoke { user_id } => {
            let revoked = store.revoke_all_for_user(user_id).await?;
            output_success(
                &output_format,
                &format!("Revoked {} sessions for user {}", revoked, user_id),
                Some(json!({ "userId": user_id, "revoked": revoked })),
            )
        }
        TokenCommands::Purge => {
            let deleted = store.purge_expired_or_revoked().await?;
            output_success(
                &output_format,
                &format!("Deleted {} expired or revoked sessions", deleted),
                Some(json!({ "cleanedUp": deleted })),
            )
        }
    }
}
