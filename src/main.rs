use alchemy_bridge::alchemy::AlchemyClient;
use alchemy_bridge::config::Config;
use alchemy_bridge::server::router::{BridgeState, bridge_router};
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn init_tracing(cfg: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &alchemy_bridge::config::CONFIG;
    init_tracing(cfg);

    if cfg.basic.bridge_key.trim().is_empty() {
        return Err("basic.bridge_key must be set and non-empty".into());
    }

    info!(
        database_url = %cfg.basic.database_url,
        auth_base_url = %cfg.alchemy.auth_base_url,
        core_base_url = %cfg.alchemy.core_base_url,
        "starting alchemy-bridge"
    );

    let db = alchemy_bridge::db::spawn(&cfg.basic.database_url).await;
    let alchemy = AlchemyClient::new(Arc::new(cfg.alchemy.clone()));
    let state = BridgeState::new(alchemy, db, Arc::from(cfg.basic.bridge_key.as_str()));

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {addr}");

    axum::serve(listener, bridge_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
