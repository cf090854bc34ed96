use chrono::Local;
use habit_dashboard::config::resolve_settings_path;
use habit_dashboard::{router, resolve_data_path, AppState, FileStore};
use std::{env, net::SocketAddr, time::Duration};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let data_path = resolve_data_path();
    let settings_path = resolve_settings_path();
    info!(data = %data_path.display(), settings = %settings_path.display(), "opening store");

    let store = FileStore::open(data_path, settings_path).await?;
    let state = AppState::new(store);

    // Close anything left open while the app was not running, before serving requests.
    {
        let mut tracker = state.tracker.lock().await;
        let report = tracker.run_rollover_sweep(Local::now().naive_local()).await?;
        info!(today = %report.today, closed = report.closed.len(), "startup sweep done");
    }

    tokio::spawn(sweep_loop(state.clone()));

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn sweep_loop(state: AppState) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let mut tracker = state.tracker.lock().await;
        match tracker.run_rollover_sweep(Local::now().naive_local()).await {
            Ok(report) if !report.closed.is_empty() => {
                info!(today = %report.today, closed = ?report.closed, "day rollover");
            }
            Ok(_) => {}
            Err(err) => error!("rollover sweep failed: {err}"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
