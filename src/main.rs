use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::info;

use hotdesk::directory::Directory;
use hotdesk::engine::Engine;
use hotdesk::model::DEFAULT_GAP_MINUTES;
use hotdesk::wire::{self, Handler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("HOTDESK_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    hotdesk::observability::init(metrics_port);

    let port = std::env::var("HOTDESK_PORT").unwrap_or_else(|_| "7040".into());
    let bind = std::env::var("HOTDESK_BIND").unwrap_or_else(|_| "0.0.0.0".into());
    let max_connections: usize = std::env::var("HOTDESK_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(256);
    let default_gap: i64 = std::env::var("HOTDESK_DEFAULT_GAP_MINUTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_GAP_MINUTES);
    let admin_login = std::env::var("HOTDESK_ADMIN_LOGIN").unwrap_or_else(|_| "admin".into());
    let admin_password =
        std::env::var("HOTDESK_ADMIN_PASSWORD").unwrap_or_else(|_| "admin".into());
    let seed_demo = std::env::var("HOTDESK_SEED_DEMO")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let tls_cert = std::env::var("HOTDESK_TLS_CERT").ok();
    let tls_key = std::env::var("HOTDESK_TLS_KEY").ok();
    let tls_acceptor = hotdesk::tls::load_tls_acceptor(tls_cert.as_deref(), tls_key.as_deref())?;

    let engine = Arc::new(Engine::new());
    let directory = Arc::new(Directory::new());
    directory.create_admin(&admin_login, &admin_password)?;
    if seed_demo {
        hotdesk::seed::populate(&engine, &directory, default_gap).await;
    }

    let handler = Arc::new(Handler::new(engine.clone(), directory.clone(), default_gap));
    let semaphore = Arc::new(Semaphore::new(max_connections));

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("hotdesk listening on {addr}");
    info!("  facilities: {}", engine.facility_count());
    info!("  users: {}", directory.user_count());
    info!("  default_gap_minutes: {default_gap}");
    info!("  max_connections: {max_connections}");
    info!("  tls: {}", if tls_acceptor.is_some() { "enabled" } else { "disabled" });
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    // Graceful shutdown: stop accepting on SIGTERM/ctrl-c, drain in-flight connections
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (socket, peer) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::error!("accept error: {e}");
                        continue;
                    }
                };

                let permit = match semaphore.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        tracing::warn!("connection limit reached, rejecting {peer}");
                        metrics::counter!(hotdesk::observability::CONNECTIONS_REJECTED_TOTAL).increment(1);
                        drop(socket);
                        continue;
                    }
                };

                info!("connection from {peer}");
                metrics::counter!(hotdesk::observability::CONNECTIONS_TOTAL).increment(1);
                metrics::gauge!(hotdesk::observability::CONNECTIONS_ACTIVE).increment(1.0);
                let h = handler.clone();
                let tls = tls_acceptor.clone();

                tokio::spawn(async move {
                    let _permit = permit; // held until connection closes
                    if let Err(e) = wire::process_connection(socket, h, tls).await {
                        tracing::error!("connection error from {peer}: {e}");
                    }
                    metrics::gauge!(hotdesk::observability::CONNECTIONS_ACTIVE).decrement(1.0);
                });
            }
            _ = &mut shutdown => {
                info!("shutdown signal received, stopping accept loop");
                break;
            }
        }
    }

    // Wait for in-flight connections to finish (up to 10s)
    info!("draining connections...");
    let drain_deadline = tokio::time::sleep(std::time::Duration::from_secs(10));
    tokio::pin!(drain_deadline);

    loop {
        if semaphore.available_permits() == max_connections {
            info!("all connections drained");
            break;
        }
        tokio::select! {
            _ = &mut drain_deadline => {
                let remaining = max_connections - semaphore.available_permits();
                tracing::warn!("drain timeout, {remaining} connections still open");
                break;
            }
            _ = tokio::time::sleep(std::time::Duration::from_millis(100)) => {}
        }
    }

    info!("hotdesk stopped");
    Ok(())
}
