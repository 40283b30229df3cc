// Maintenance helper: removes a contact row outright, whatever its status.
// Used to clean up fixtures created against a shared database.

use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::database::models::Contact;
use crate::database::{DatabaseManager, PgStore, Repository};

pub async fn handle(config: &AppConfig, account_id: i64, email: &str) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let repo: Repository<Contact> = Repository::new(Arc::new(PgStore::new(pool)));

    let removed = repo.remove_by_email(email, account_id).await?;
    println!("Removed {} contact(s) with email {} from account {}", removed, email, account_id);
    Ok(())
}
