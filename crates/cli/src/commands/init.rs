use std::path::Path;

use girder_core::config::{
    DatabaseConfig, ErpNextConfig, GirderConfig, GirderSection, SourceConfig,
};
use girder_core::db::DatabasePool;
use girder_core::sources::SourceKind;
use tracing::info;

/// Run the `init` command: create the data directory, write a default config,
/// and set up the database.
pub async fn run(config_path: &str, data_dir: &str, source: &str) -> anyhow::Result<()> {
    let data_path = Path::new(data_dir);

    if !data_path.exists() {
        std::fs::create_dir_all(data_path)?;
        info!("Created data directory: {}", data_dir);
    }

    let source_kind: SourceKind = source
        .parse()
        .map_err(|_| anyhow::anyhow!("Unknown data source: {source}. Supported: mock, erpnext, civitbuild"))?;

    let db_path = data_path.join("girder.db");
    let db_path_str = db_path.to_string_lossy().to_string();

    let config = GirderConfig {
        girder: GirderSection {
            instance_name: "My Construction Company".into(),
            data_dir: data_dir.to_string(),
            database: DatabaseConfig {
                path: Some(db_path_str.clone()),
            },
        },
        source: SourceConfig {
            active: source_kind.as_str().to_string(),
            erpnext: ErpNextConfig::default(),
            ..Default::default()
        },
    };

    let serialized = toml::to_string_pretty(&config)?;
    std::fs::write(config_path, serialized)?;
    info!("Wrote configuration: {}", config_path);

    // Create the database and run migrations up front.
    let connect_str = format!("sqlite:{}?mode=rwc", db_path_str);
    DatabasePool::new_sqlite(&connect_str).await?;
    info!("Initialized database: {}", db_path_str);

    println!("Girder initialized.");
    println!("  Config:      {config_path}");
    println!("  Data dir:    {data_dir}");
    println!("  Database:    {db_path_str}");
    println!("  Data source: {source_kind}");
    if source_kind == SourceKind::ErpNext {
        println!();
        println!("Set source.erpnext.base_url, api_key, and api_secret in {config_path} before syncing.");
    }

    Ok(())
}
