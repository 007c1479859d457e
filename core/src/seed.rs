//! Seed database creation for generated projects.
//!
//! Executes a generated schema file against a fresh SQLite store with the
//! journaling and integrity pragmas the generated server expects.

use crate::errors::{AgentError, AgentResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection, Executor};
use std::path::Path;
use tracing::info;

/// Create (or recreate) a seed database at `db_path` by executing the SQL
/// schema at `schema_path`. Parent directories are created as needed. The
/// store is opened in WAL mode with foreign keys enabled.
pub async fn create_seed_database(schema_path: &Path, db_path: &Path) -> AgentResult<()> {
    let schema_sql = tokio::fs::read_to_string(schema_path).await?;

    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let mut conn = options
        .connect()
        .await
        .map_err(|e| AgentError::ExecutionError(format!("failed to open {}: {e}", db_path.display())))?;

    // Raw string execution runs every statement in the schema.
    conn.execute(schema_sql.as_str())
        .await
        .map_err(|e| AgentError::ExecutionError(format!("schema execution failed: {e}")))?;

    conn.close()
        .await
        .map_err(|e| AgentError::ExecutionError(format!("failed to close database: {e}")))?;

    info!(db = %db_path.display(), "seed database created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"
        CREATE TABLE authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );
        CREATE TABLE books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author_id INTEGER NOT NULL,
            FOREIGN KEY (author_id) REFERENCES authors(id)
        );
        INSERT INTO authors (name) VALUES ('Ursula K. Le Guin');
        INSERT INTO books (title, author_id) VALUES ('The Dispossessed', 1);
    "#;

    #[tokio::test]
    async fn creates_store_from_multi_statement_schema() {
        let dir = TempDir::new().unwrap();
        let schema_path = dir.path().join("schema.sql");
        std::fs::write(&schema_path, SCHEMA).unwrap();
        let db_path = dir.path().join("data/seed.db");

        create_seed_database(&schema_path, &db_path).await.unwrap();
        assert!(db_path.exists());

        let options = SqliteConnectOptions::new().filename(&db_path);
        let mut conn = options.connect().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn missing_schema_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = create_seed_database(
            &dir.path().join("nope.sql"),
            &dir.path().join("seed.db"),
        )
        .await;
        assert!(result.is_err());
    }
}
