use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
};
use db::{DBService, models::language::Language};
use services::services::{
    bilingual::BilingualSynchronizer,
    config::Config,
    database_validator::DatabaseValidator,
    language_model::{ClaudeClient, LanguageModel, UnconfiguredModel},
    translation::TranslationGateway,
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub mod error;
pub mod extract;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub synchronizer: BilingualSynchronizer,
    pub default_language: Language,
}

impl AppState {
    pub fn new(db: DBService, model: Arc<dyn LanguageModel>, default_language: Language) -> Self {
        Self {
            db,
            synchronizer: BilingualSynchronizer::new(TranslationGateway::new(model)),
            default_language,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let db = DBService::new(&config.database_url).await?;
    let report = DatabaseValidator::new(db.pool.clone()).validate().await?;
    info!("{}", report.summary());

    let model: Arc<dyn LanguageModel> = match config.model_settings() {
        Some(settings) => {
            let client = ClaudeClient::new(settings)?;
            info!(model = %client.model(), "Translation model configured");
            Arc::new(client)
        }
        None => {
            warn!("Translation disabled: no API key configured");
            Arc::new(UnconfiguredModel)
        }
    };

    let app = app(AppState::new(db, model, config.default_language));

    let address = config.address();
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
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
}
