//! Faultline: a rule-based fault-injection service for chaos testing.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use faultline_api::{create_router, init_metrics};
use faultline_core::config::{Config, LogFormat};
use faultline_core::{ErrorAction, ErrorCondition, ErrorRule};
use faultline_engine::metrics::init_engine_metrics;
use faultline_engine::{ErrorInjector, RuleEngine, RuleStore, StatsStore};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => run_server(args).await,
        Commands::Version => {
            println!("faultline {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn run_server(args: cli::ServeArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;

    // Apply CLI overrides
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(environment) = args.environment {
        config.server.environment = environment;
    }
    config.validate().context("Invalid configuration")?;

    init_logging(&config)?;

    if config.metrics.enabled {
        init_metrics();
        init_engine_metrics();

        let metrics_addr: std::net::SocketAddr =
            format!("{}:{}", config.metrics.bind, config.metrics.port)
                .parse()
                .context("Invalid metrics bind address")?;

        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
            .context("Failed to install Prometheus exporter")?;

        info!("Metrics endpoint listening on http://{}/metrics", metrics_addr);
    }

    info!(
        max_rules = config.engine.max_rules,
        default_probability = config.engine.default_probability,
        enable_statistics = config.engine.enable_statistics,
        global_probability = config.injection.global_probability,
        "Service configuration"
    );

    let store = Arc::new(RuleStore::new());
    let engine = Arc::new(RuleEngine::new());
    let stats = Arc::new(StatsStore::new(
        config.engine.stats_capacity,
        config.engine.stat_retention_hours,
    ));
    let injector = Arc::new(ErrorInjector::new(config.clone(), store, engine, stats));

    if config.server.environment == "development" {
        add_sample_rules(&injector);
    }

    let app = create_router(injector, config.logging.log_requests);

    let listener = TcpListener::bind(config.server.bind)
        .await
        .context("Failed to bind to address")?;
    info!("Faultline listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn load_config(path: &Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path).context("Failed to load configuration"),
        None => Ok(Config::default()),
    }
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry().with(filter).with(fmt_layer.json()).init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry().with(filter).with(fmt_layer).init();
        }
    }

    Ok(())
}

/// Seeds a few representative rules so a development instance has something
/// to show immediately.
fn add_sample_rules(injector: &ErrorInjector) {
    info!("Adding sample error injection rules for development");

    let rules = vec![
        ErrorRule::new(
            "Storage Service Random Error",
            "storage-service",
            ErrorAction::HttpError {
                code: 500,
                message: "Internal server error injected for testing".to_string(),
            },
        )
        .with_description("Randomly inject 500 errors into storage service operations")
        .with_priority(1)
        .with_condition(ErrorCondition::probability(0.1)),
        ErrorRule::new(
            "Metadata Service Delay",
            "metadata-service",
            ErrorAction::Delay { delay_ms: 2000 },
        )
        .with_description("Add delay to metadata service operations")
        .with_operation("GetMetadata")
        .with_priority(2)
        .with_condition(ErrorCondition::probability(0.2)),
        ErrorRule::new(
            "Queue Service Network Error",
            "queue-service",
            ErrorAction::NetworkError { message: "Network timeout injected".to_string() },
        )
        .with_description("Inject network errors into queue service")
        .with_priority(3)
        .with_max_triggers(10)
        .with_condition(ErrorCondition::probability(0.05))
        .with_enabled(false),
    ];

    for rule in rules {
        let name = rule.name.clone();
        match injector.add_rule(rule) {
            Ok(added) => {
                info!(rule_name = %added.name, enabled = added.enabled, "Added sample rule");
            }
            Err(e) => {
                warn!(rule_name = %name, error = %e, "Failed to add sample rule");
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
