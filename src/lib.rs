pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use cli::{Cli, Commands, FeedCommand};
pub use config::Config;
use db::Store;
use state::SharedState;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;

    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config, prometheus_handle).await,
        Commands::Fetch { feed } => run_fetch(config, feed).await,
        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists, leaving it untouched.");
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "repopulse")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("repopulse v{} starting...", env!("CARGO_PKG_VERSION"));

    let store = Store::from_config(&config.general).await?;
    let port = config.server.port;

    let shared = SharedState::new(config, store.clone())?;
    let app = api::router(api::create_app_state(shared, prometheus_handle));

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    store.close().await?;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

async fn run_fetch(config: Config, feed: FeedCommand) -> anyhow::Result<()> {
    let store = Store::from_config(&config.general).await?;
    let shared = SharedState::new(config, store.clone())?;
    let discovery = &shared.config.discovery;

    let json = match feed {
        FeedCommand::Global => {
            let report = shared
                .pipeline
                .aggregate(&discovery.global_feed.feed_query())
                .await?;
            serde_json::to_string_pretty(&report.repositories)?
        }
        FeedCommand::Language { language } => {
            let report = shared
                .pipeline
                .aggregate(&discovery.language_feed.feed_query(&language))
                .await?;
            serde_json::to_string_pretty(&report.repositories)?
        }
        FeedCommand::Issues => serde_json::to_string_pretty(&shared.issues.active_issues().await?)?,
    };

    println!("{json}");
    store.close().await?;
    Ok(())
}
