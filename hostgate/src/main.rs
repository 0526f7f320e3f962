mod config;

use clap::Parser;
use metrics_exporter_statsd::StatsdBuilder;
use routes::config::ControlConfig;
use routes::manager::RouteManager;
use routes::redis_store::RedisRouteStore;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hostgate", about = "Host-routed dynamic reverse proxy")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, short, default_value = "hostgate.yaml")]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum RunError {
    #[error("store error: {0}")]
    Store(#[from] routes::store::StoreError),
    #[error("startup reload failed: {0}")]
    Reload(#[from] routes::errors::RoutesError),
    #[error("gateway error: {0}")]
    Gateway(#[from] gateway::errors::GatewayError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match config::Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, path = %cli.config.display(), "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let _sentry_guard = config.common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    if let Some(metrics_config) = &config.common.metrics {
        init_metrics(metrics_config);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(%err, "failed to build runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: config::Config) -> Result<(), RunError> {
    let store = RedisRouteStore::connect(&config.store).await?;
    let manager = RouteManager::new(Arc::new(store));

    // Serving with an empty table and no way to fill it is worse than
    // not starting; a failed initial load is fatal.
    manager.reload().await?;

    let control_task = run_control_api(config.control, manager.clone());
    let gateway_task = gateway::run(config.gateway, manager);

    tokio::select! {
        result = gateway_task => result?,
        result = control_task => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }
    Ok(())
}

async fn run_control_api(config: ControlConfig, manager: RouteManager) -> Result<(), RunError> {
    let app = routes::api::router(manager);
    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        config.listener.host, config.listener.port
    ))
    .await?;
    tracing::info!(addr = %listener.local_addr()?, "control api listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_metrics(config: &config::MetricsConfig) {
    match StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some("hostgate"))
    {
        Ok(recorder) => {
            if let Err(err) = metrics::set_global_recorder(recorder) {
                tracing::warn!(%err, "metrics recorder already installed");
            } else {
                shared::metrics_defs::register(routes::metrics_defs::ALL_METRICS);
                shared::metrics_defs::register(gateway::metrics_defs::ALL_METRICS);
            }
        }
        Err(err) => tracing::warn!(%err, "failed to initialize statsd exporter"),
    }
}
