mod app;
mod catalog;
mod config;
mod routes;
mod state;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::catalog::Catalog;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let data_dir = config::data_dir();
    let geometry_file = config::geometry_file();
    let catalog = match Catalog::load(&data_dir, &geometry_file).await {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(error = %e, "failed to load hexagon geometry");
            return;
        }
    };
    tracing::info!(
        hexagons = catalog.hex_count(),
        path = %catalog.geometry_path().display(),
        "Hexagon geometry loaded"
    );

    let read_tables = config::audit_tables_enabled();
    let report = catalog::audit_distance_tables(&catalog, read_tables).await;
    if report.is_clean() {
        tracing::info!(present = report.present, read_tables, "Distance tables verified");
    } else {
        tracing::warn!(
            present = report.present,
            missing_files = report.missing_files.len(),
            malformed = report.malformed.len(),
            incomplete = report.incomplete.len(),
            first_missing = ?report.missing_files.first().map(|id| id.get()),
            read_tables,
            "Distance tables are inconsistent with the geometry; affected hexagons will show no data"
        );
    }

    let app = app::build_app(AppState::new(catalog, config::dist_dir()));

    let addr = format!("0.0.0.0:{}", config::server_port());
    tracing::info!("Hex map server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
