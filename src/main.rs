use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rift_overlay::api::state::AppState;
use rift_overlay::cache::ResultCache;
use rift_overlay::config::AppConfig;
use rift_overlay::extract::build_extractor;
use rift_overlay::fetch::{ProfileFetcher, ProfileFetcherConfig};
use rift_overlay::leaderboard::{
    AccountAggregator, AssemblerConfig, HttpLeaderboardClient, LeaderboardAssembler,
    PrivilegedConfig, UpstreamConfig,
};
use rift_overlay::scheduler::{resolve_interval, CleanupFn, CleanupScheduler};
use rift_overlay::store::OverlayStore;

#[derive(Parser)]
#[command(name = "rift-overlay")]
#[command(about = "Stream overlay backend with ranked leaderboard aggregation")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one leaderboard assembly and print it as JSON
    Assemble {
        /// Build from the configured roster instead of the upstream listing
        #[arg(long)]
        roster: bool,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Remove expired overlays and exit
    Cleanup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rift-overlay v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_or_default(&PathBuf::from(&cli.config))?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let cache = Arc::new(ResultCache::new(Duration::from_secs(
                config.cache.sweep_minutes * 60,
            )));
            cache.start_sweep();

            let store = Arc::new(OverlayStore::new(config.data_dir.clone()));
            let assembler = Arc::new(build_assembler(&config)?);

            let scheduler = if config.scheduler.enabled {
                let interval = resolve_interval(&config.scheduler.interval);
                let cleanup_store = Arc::clone(&store);
                let cleanup_cache = Arc::clone(&cache);
                let callback: CleanupFn = Arc::new(move || {
                    let overlays = cleanup_store.cleanup_expired();
                    let cache_entries = cleanup_cache.cleanup();
                    Ok(overlays + cache_entries)
                });

                let scheduler = Arc::new(CleanupScheduler::new(interval, callback));
                scheduler.start();
                Some(scheduler)
            } else {
                tracing::info!("Scheduler is disabled via configuration");
                None
            };

            let state = AppState {
                cache: Arc::clone(&cache),
                assembler,
                store,
                leaderboard_ttl_minutes: config.leaderboard.cache_ttl_minutes,
                overlay_expiration_hours: config.overlay.expiration_hours,
            };

            let app = rift_overlay::api::build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            // Ordered teardown once the server loop exits.
            if let Some(scheduler) = scheduler {
                scheduler.stop();
            }
            cache.shutdown();
            tracing::info!("Shutdown complete");
        }
        Commands::Assemble { roster, pretty } => {
            let assembler = build_assembler(&config)?;

            let output = if roster {
                let ranks = assembler.roster_leaderboard().await;
                serde_json::to_value(ranks)?
            } else {
                match assembler.assemble().await {
                    Ok(entries) => serde_json::to_value(entries)?,
                    Err(e) => {
                        tracing::error!("Assembly failed: {}", e);
                        std::process::exit(1);
                    }
                }
            };

            if pretty {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", serde_json::to_string(&output)?);
            }
        }
        Commands::Cleanup => {
            let store = OverlayStore::new(config.data_dir.clone());
            let removed = store.cleanup_expired();
            let stats = store.stats();

            println!("\n=== Cleanup Results ===");
            println!("Removed:  {}", removed);
            println!("Active:   {}", stats.active);
        }
    }

    Ok(())
}

/// Wire the pipeline components from configuration.
fn build_assembler(config: &AppConfig) -> Result<LeaderboardAssembler> {
    let extractor = build_extractor(config.leaderboard.extractor);

    let fetcher = ProfileFetcher::new(
        ProfileFetcherConfig {
            base_url: config.leaderboard.profile_base_url.clone(),
            timeout: Duration::from_secs(config.leaderboard.scrape_timeout_secs),
            ..Default::default()
        },
        extractor,
    )?;

    let source = HttpLeaderboardClient::new(
        UpstreamConfig {
            leaderboard_url: config.leaderboard.leaderboard_url.clone(),
            timeout: Duration::from_secs(config.leaderboard.upstream_timeout_secs),
        },
        PrivilegedConfig {
            entries_url: config.override_account.entries_url.clone(),
            api_key: config.override_account.api_key.clone(),
            puuid: config.override_account.puuid.clone(),
        },
    )?;

    Ok(LeaderboardAssembler::new(
        Arc::new(source),
        AccountAggregator::new(Arc::new(fetcher)),
        config.roster.clone(),
        AssemblerConfig {
            override_player: config.override_account.player.clone(),
            override_handle: config.override_account.handle.clone(),
            default_region: config.leaderboard.default_region.clone(),
        },
    ))
}

/// Single top-level shutdown listener: resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
