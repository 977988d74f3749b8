use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use girder_core::config::GirderConfig;
use girder_core::models::sync::SyncOutcome;
use girder_core::sources::erpnext::ErpNextConnector;
use girder_core::sources::{SourceDispatcher, SourceKind};
use tracing::{error, info};

use super::open_repository;

/// Run the `sync` command: one full sync through the configured source.
pub async fn run(config_path: &str, dry_run: bool) -> anyhow::Result<()> {
    let config = GirderConfig::load(Path::new(config_path))?;
    config.validate()?;

    info!("Loaded configuration from {}", config_path);

    let repo = Arc::new(open_repository(&config).await?);
    let dispatcher = SourceDispatcher::from_config(repo.clone(), &config.source);
    let source = dispatcher.active_source().await;

    if dry_run {
        println!("Dry run mode - no data will be written");
        println!("Active source: {source}");
        if source == SourceKind::ErpNext {
            let connector = ErpNextConnector::new(&config.source.erpnext, repo);
            match connector.test_connection().await {
                Ok(()) => {
                    println!("Connection test: SUCCESS");
                    info!("Dry run connection test passed");
                }
                Err(e) => {
                    println!("Connection test: FAILED - {e}");
                    error!("Dry run connection test failed: {e}");
                }
            }
        } else {
            println!("Nothing to verify for this source.");
        }
        return Ok(());
    }

    println!("Starting sync from {source}...");
    let start = Instant::now();

    match dispatcher.sync().await {
        Ok(outcome) => {
            let duration = start.elapsed();
            println!("Sync completed in {:.1}s", duration.as_secs_f64());
            print_outcome(&outcome);
        }
        Err(e) => {
            error!("Sync failed: {e}");
            println!("Sync failed: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

fn print_outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Seeded { summary } => {
            println!("  Source:          mock (seeded)");
            println!("  Clients:         {}", summary.clients);
            println!("  Projects:        {}", summary.projects);
            println!("  Vendors:         {}", summary.vendors);
            println!("  Employees:       {}", summary.employees);
            println!("  Finance records: {}", summary.finance_records);
            println!("  Purchase orders: {}", summary.purchase_orders);
            println!("  Inventory items: {}", summary.inventory_items);
        }
        SyncOutcome::Synced { report } => {
            for result in &report.results {
                println!(
                    "  {:<16} {} records, {} anomalies",
                    result.resource, result.count, result.anomalies
                );
            }
            println!(
                "  Total:           {} records, {} anomalies",
                report.records(),
                report.anomalies()
            );
        }
        SyncOutcome::NotImplemented { source } => {
            println!("  Source '{source}' has no sync implementation yet; nothing was written.");
        }
    }
}
