//! Database configuration module for AgroChain.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. Parent tables are created before the
//! child tables whose foreign keys point at them.

use crate::entities::{
    AuditLog, Crop, InventoryItem, InventoryReview, Notification, Order, RetailerOrder,
    RetailerOrderProduct, User, Vehicle,
};
use crate::errors::Result;
use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::info;

/// Default location of the `SQLite` file when nothing else is configured.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/agrochain.sqlite?mode=rwc";

/// Resolves the database URL.
///
/// `DATABASE_URL` in the environment wins, then the configured value, then
/// [`DEFAULT_DATABASE_URL`].
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| configured.map(ToString::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// File path behind a `sqlite:` URL, or `None` for in-memory databases.
fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path.contains(":memory:") || path == "memory" {
        return None;
    }
    Some(Path::new(path))
}

/// Establishes a connection to the database at `database_url`, creating the
/// directory of a file-backed `SQLite` database first.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file_path(database_url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    info!(url = database_url, "Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates every table that does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements: Vec<TableCreateStatement> = vec![
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Crop),
        schema.create_table_from_entity(Vehicle),
        schema.create_table_from_entity(InventoryItem),
        schema.create_table_from_entity(InventoryReview),
        schema.create_table_from_entity(Notification),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(RetailerOrder),
        schema.create_table_from_entity(RetailerOrderProduct),
        schema.create_table_from_entity(AuditLog),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    Ok(())
}
