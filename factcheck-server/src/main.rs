use std::sync::Arc;

use clap::Parser;
use factcheck_core::{FactStore, FactcheckConfig, MemoryFactStore, PgFactStore};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "factcheck.toml")]
    config: String,

    /// Check database connectivity and exit
    #[arg(long)]
    health: bool,

    /// Serve from a process-local store instead of PostgreSQL
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match FactcheckConfig::load(&args.config) {
        Ok(c) => c,
        Err(_) if args.ephemeral => FactcheckConfig::ephemeral(),
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let store: Arc<dyn FactStore> = if args.ephemeral {
        tracing::warn!("Running with an in-memory store; facts are lost on exit");
        Arc::new(MemoryFactStore::new())
    } else {
        // Connect to DB
        let pool = match factcheck_core::db::create_pool(&config.database).await {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Failed to connect to database: {}", e);
                std::process::exit(1);
            }
        };

        if args.health {
            match factcheck_core::db::health_check(&pool).await {
                Ok(v) => println!("✅ PostgreSQL connected: {}", v),
                Err(e) => {
                    println!("❌ PostgreSQL connection failed: {}", e);
                    std::process::exit(1);
                }
            }
            return Ok(());
        }

        if config.database.bootstrap_schema {
            factcheck_core::db::ensure_schema(&pool).await?;
            tracing::info!("Schema ready");
        }

        Arc::new(PgFactStore::new(pool))
    };

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    factcheck_server::http::start_http_server(store, config, tx.subscribe()).await?;

    Ok(())
}
