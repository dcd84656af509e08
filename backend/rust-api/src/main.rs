use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use gastoagil_api::database::{self, PgBoletaStore};
use gastoagil_api::services::TesseractEngine;
use gastoagil_api::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let default_filter = match std::env::var("LOG_LEVEL") {
        Ok(level) => format!("gastoagil_api={},tower_http={}", level.to_lowercase(), level.to_lowercase()),
        Err(_) => "gastoagil_api=debug,tower_http=debug".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    info!("Starting GastoÁgil API server...");

    let config = Arc::new(Config::from_env()?);
    info!("Configuration loaded");
    if config.storage_url.is_none() {
        warn!("STORAGE_URL/SUPABASE_URL not set: /ocr/from-storage will fetch any signed URL");
    }

    let db_pool = database::new_pool(&config.database_url).await?;
    info!("Database connection pool created and migrations applied");

    let state = AppState {
        store: Arc::new(PgBoletaStore::new(db_pool)),
        ocr: Arc::new(TesseractEngine::new(&config.tesseract_cmd, &config.ocr_lang)),
        http_client: reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?,
        config: config.clone(),
    };

    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutting down gracefully...");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
