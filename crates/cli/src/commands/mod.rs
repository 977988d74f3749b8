pub mod init;
pub mod serve;
pub mod status;
pub mod sync;

use girder_core::config::GirderConfig;
use girder_core::db::sqlite::SqliteRepository;
use girder_core::db::DatabasePool;

/// Open the configured SQLite database and wrap it in a repository.
pub async fn open_repository(config: &GirderConfig) -> anyhow::Result<SqliteRepository> {
    let path = config
        .girder
        .database
        .path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("SQLite path not configured"))?;
    let connect_str = format!("sqlite:{}?mode=rwc", path);
    let pool = DatabasePool::new_sqlite(&connect_str).await?;
    let DatabasePool::Sqlite(sqlite_pool) = pool;
    Ok(SqliteRepository::new(sqlite_pool))
}
