use std::path::Path;

use girder_core::config::GirderConfig;
use girder_core::db::repository::{
    ClientRepository, EmployeeRepository, FinanceRepository, InventoryRepository,
    ProjectRepository, PurchaseOrderRepository, SyncRunRepository, VendorRepository,
};
use tracing::info;

use super::open_repository;

/// Run the `status` command: show the last sync run and store statistics.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let config = GirderConfig::load(Path::new(config_path))?;
    config.validate()?;

    info!("Loaded configuration from {}", config_path);

    let repo = open_repository(&config).await?;

    let db_size = config
        .girder
        .database
        .path
        .as_deref()
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|| "unknown".to_string());

    println!("Girder Status");
    println!("=============");
    println!("Instance:    {}", config.girder.instance_name);
    println!("Data source: {}", config.source.active);
    println!("Database:    SQLite ({db_size})");
    println!();

    match repo.latest_sync_run().await? {
        Some(run) => {
            println!("Last Sync");
            println!("---------");
            println!("Source:    {}", run.source);
            println!("Status:    {:?}", run.status);
            println!(
                "Started:   {}",
                run.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if let Some(completed) = run.completed_at {
                println!("Completed: {}", completed.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            println!("Records:   {}", run.records_synced);
            if run.anomalies > 0 {
                println!("Anomalies: {}", run.anomalies);
            }
            if let Some(ref err) = run.error_message {
                println!("Error:     {err}");
            }
            println!();
        }
        None => {
            println!("No sync runs recorded.");
            println!();
        }
    }

    println!("Store Counts");
    println!("------------");
    println!("Clients:         {}", repo.count_clients().await?);
    println!("Projects:        {}", repo.count_projects().await?);
    println!("Vendors:         {}", repo.count_vendors().await?);
    println!("Employees:       {}", repo.count_employees().await?);
    println!("Finance records: {}", repo.count_finance_records().await?);
    println!("Purchase orders: {}", repo.count_purchase_orders().await?);
    println!("Inventory items: {}", repo.count_inventory_items().await?);

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
