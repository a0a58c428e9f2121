#![forbid(unsafe_code)]

use petzone_server::{build_router, validate_startup_config, AppState, ServerConfig};
use petzone_store::Store;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

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

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Seeds the first admin account when PETZONE_ADMIN_USER and
/// PETZONE_ADMIN_PASSWORD are set. An existing username is left untouched.
fn bootstrap_admin(store: &Store) {
    let (Ok(username), Ok(password)) = (
        env::var("PETZONE_ADMIN_USER"),
        env::var("PETZONE_ADMIN_PASSWORD"),
    ) else {
        return;
    };
    let username = username.trim().to_string();
    if username.is_empty() || password.len() < 8 {
        warn!("admin bootstrap skipped: username empty or password shorter than 8 chars");
        return;
    }
    match store.create_admin_user(&username, &password, None, "admin") {
        Ok(admin) => info!(username = %admin.username, "bootstrapped admin account"),
        Err(petzone_store::StoreError::Conflict(_)) => {}
        Err(e) => warn!(err = %e, "admin bootstrap failed"),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = ServerConfig::from_env();
    init_tracing(config.log_json);
    validate_startup_config(&config)?;

    let store = Store::open(Path::new(&config.database_path))
        .map_err(|e| format!("open database {}: {e}", config.database_path))?;
    bootstrap_admin(&store);

    let bind_addr = config.bind_addr.clone();
    let drain = config.shutdown_drain;
    let sweep_interval = config.session_sweep_interval;
    let state = AppState::new(store, config);
    let app = build_router(state.clone());

    let sessions = Arc::clone(&state.sessions);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            sessions.sweep();
        }
    });

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
    info!("petzone-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            // Keep serving in-flight requests while the load balancer drains us.
            tokio::time::sleep(drain).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
