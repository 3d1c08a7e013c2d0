//! Stats command - print current review load per user

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use reviewer_core::{AssignmentService, Config};
use reviewer_db::Database;

/// Show how many open review slots each user holds
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// SQLite database file (overrides config and env)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl StatsArgs {
    /// Execute the stats command
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let config = config.with_cli_overrides(None, self.db.clone());
        let db = Database::connect(&config.database)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

        let service = AssignmentService::new(Arc::new(db.clone()));
        let items = service.assignment_stats().await?;
        db.close().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }

        if items.is_empty() {
            println!("No review assignments.");
            return Ok(());
        }

        let width = items
            .iter()
            .map(|i| i.user_id.len())
            .max()
            .unwrap_or(0)
            .max("USER".len());

        println!("{:<width$}  COUNT", "USER", width = width);
        for item in &items {
            println!("{:<width$}  {}", item.user_id, item.count, width = width);
        }

        Ok(())
    }
}
