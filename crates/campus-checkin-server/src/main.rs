#![forbid(unsafe_code)]

use campus_checkin_server::{
    build_router, validate_startup_config_contract, ApiConfig, AppState, CONFIG_SCHEMA_VERSION,
};
use campus_checkin_store::SqliteLedger;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("signal handlers unavailable, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let api_cfg = ApiConfig::from_env();
    init_tracing(api_cfg.log_json);
    validate_startup_config_contract(&api_cfg)?;

    let ledger = SqliteLedger::open(&api_cfg.db_path)
        .map_err(|e| format!("open ledger {}: {e}", api_cfg.db_path.display()))?;
    info!(
        db_path = %api_cfg.db_path.display(),
        signed_tickets = api_cfg.ticket_secret.is_some(),
        config_schema_version = CONFIG_SCHEMA_VERSION,
        checkin_budget_ms = api_cfg.checkin_budget().as_millis() as u64,
        "ledger opened"
    );

    let bind_addr = api_cfg.bind.clone();
    let drain = api_cfg.shutdown_drain;
    let state = AppState::with_config(Arc::new(ledger), api_cfg);
    let app = build_router(state.clone());

    state.ready.store(false, Ordering::Relaxed);
    match state.ledger.probe().await {
        Ok(()) => state.ready.store(true, Ordering::Relaxed),
        Err(e) => error!("initial ledger probe failed: {e}"),
    }

    let addr: std::net::SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4().map_err(|e| format!("socket v4 failed: {e}"))?
    } else {
        tokio::net::TcpSocket::new_v6().map_err(|e| format!("socket v6 failed: {e}"))?
    };
    socket
        .set_reuseaddr(true)
        .map_err(|e| format!("set_reuseaddr failed: {e}"))?;
    socket.bind(addr).map_err(|e| format!("bind failed: {e}"))?;
    let listener: TcpListener = socket
        .listen(1024)
        .map_err(|e| format!("listen failed: {e}"))?;
    info!("campus-checkin-server listening on {bind_addr}");

    let accepting = state.accepting_requests.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            accepting.store(false, Ordering::Relaxed);
            info!(drain_ms = drain.as_millis() as u64, "draining in-flight requests");
            tokio::time::sleep(drain).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
