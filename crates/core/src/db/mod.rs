pub mod repository;
pub mod sqlite;

use sqlx::SqlitePool;

use crate::error::Result;

pub enum DatabasePool {
    Sqlite(SqlitePool),
}

impl DatabasePool {
    /// Create a new SQLite database pool from a connection string and run migrations.
    pub async fn new_sqlite(path: &str) -> Result<Self> {
        let pool = SqlitePool::connect(path).await?;
        Self::run_migrations(&pool).await?;
        Ok(DatabasePool::Sqlite(pool))
    }

    /// Create a new in-memory SQLite database pool and run migrations. Useful for testing.
    pub async fn new_sqlite_memory() -> Result<Self> {
        let pool = SqlitePool::connect(":memory:").await?;
        Self::run_migrations(&pool).await?;
        Ok(DatabasePool::Sqlite(pool))
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::query("PRAGMA foreign_keys = ON;")
            .execute(pool)
            .await?;

        let migrations: &[&str] =
            &[include_str!("../../../../migrations/sqlite/001_initial_schema.sql")];

        for migration_sql in migrations {
            for statement in migration_sql.split(';') {
                let trimmed = statement.trim();
                if !trimmed.is_empty() && !trimmed.starts_with("PRAGMA") {
                    sqlx::query(trimmed).execute(pool).await?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_pool_migrates() {
        let pool = DatabasePool::new_sqlite_memory().await.unwrap();
        let DatabasePool::Sqlite(p) = pool;
        // All entity tables should exist after migration.
        for table in [
            "clients",
            "projects",
            "vendors",
            "employees",
            "finance_records",
            "purchase_orders",
            "inventory_items",
            "sync_runs",
        ] {
            let query = format!("SELECT COUNT(*) FROM {table}");
            sqlx::query(&query).execute(&p).await.unwrap();
        }
    }
}
