use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::{ensure_schema, DatabaseManager};

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Create tables and indexes that do not exist yet")]
    Init,

    #[command(about = "Check database connectivity")]
    Check,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;

    match cmd {
        DbCommands::Init => {
            let statements = ensure_schema(&pool).await?;
            output_success(
                &output_format,
                "Database schema is up to date",
                Some(json!({ "statements": statements })),
            )
        }
        DbCommands::Check => match DatabaseManager::health_check(&pool).await {
            Ok(()) => output_success(&output_format, "Database connection OK", None),
            Err(e) => {
                output_error(&output_format, &e.to_string(), Some("DATABASE_UNAVAILABLE"))?;
                Err(e.into())
            }
        },
    }
}
