use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "girder", about = "Construction ERP dashboard backend", version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "girder.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Initialize the Girder data directory and configuration
    Init {
        /// Data directory path
        #[arg(long, default_value = "/var/lib/girder")]
        data_dir: String,
        /// Active data source (mock, erpnext, civitbuild)
        #[arg(long, default_value = "mock")]
        source: String,
    },
    /// Run a sync from the configured data source
    Sync {
        /// Verify connectivity without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Show sync status and store statistics
    Status,
    /// Start the dashboard API server and the sync scheduler
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir, source } => {
            commands::init::run(&cli.config, &data_dir, &source).await?;
        }
        Commands::Sync { dry_run } => {
            commands::sync::run(&cli.config, dry_run).await?;
        }
        Commands::Status => {
            commands::status::run(&cli.config).await?;
        }
        Commands::Serve { port } => {
            commands::serve::run(&cli.config, port).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn cli_parse_init_defaults() {
        let cli = Cli::parse_from(["girder", "init"]);
        assert_eq!(cli.config, "girder.toml");
        match cli.command {
            Commands::Init { data_dir, source } => {
                assert_eq!(data_dir, "/var/lib/girder");
                assert_eq!(source, "mock");
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn cli_parse_init_custom() {
        let cli = Cli::parse_from([
            "girder",
            "--config",
            "/etc/girder.toml",
            "init",
            "--data-dir",
            "/opt/girder",
            "--source",
            "erpnext",
        ]);
        assert_eq!(cli.config, "/etc/girder.toml");
        match cli.command {
            Commands::Init { data_dir, source } => {
                assert_eq!(data_dir, "/opt/girder");
                assert_eq!(source, "erpnext");
            }
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn cli_parse_sync_defaults() {
        let cli = Cli::parse_from(["girder", "sync"]);
        match cli.command {
            Commands::Sync { dry_run } => assert!(!dry_run),
            _ => panic!("expected Sync command"),
        }
    }

    #[test]
    fn cli_parse_sync_dry_run() {
        let cli = Cli::parse_from(["girder", "sync", "--dry-run"]);
        match cli.command {
            Commands::Sync { dry_run } => assert!(dry_run),
            _ => panic!("expected Sync command"),
        }
    }

    #[test]
    fn cli_parse_status() {
        let cli = Cli::parse_from(["girder", "status"]);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn cli_parse_serve_defaults() {
        let cli = Cli::parse_from(["girder", "serve"]);
        match cli.command {
            Commands::Serve { port } => assert_eq!(port, 8080),
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn cli_parse_serve_custom_port() {
        let cli = Cli::parse_from(["girder", "serve", "--port", "3000"]);
        match cli.command {
            Commands::Serve { port } => assert_eq!(port, 3000),
            _ => panic!("expected Serve command"),
        }
    }
}
