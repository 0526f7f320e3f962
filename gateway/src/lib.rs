pub mod admin_service;
pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod service;

use errors::GatewayError;
use routes::manager::RouteManager;
use shared::http::run_http_service;

/// Run the public traffic listener and the admin listener until either
/// fails.
pub async fn run(config: config::Config, manager: RouteManager) -> Result<(), GatewayError> {
    let gateway_service =
        service::GatewayService::new(manager.table(), config.upstream_timeout_secs);
    let traffic_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        gateway_service,
    );

    let ready_manager = manager.clone();
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service::AdminService::new(move || ready_manager.is_ready()),
    );

    tokio::try_join!(traffic_task, admin_task)?;
    Ok(())
}
