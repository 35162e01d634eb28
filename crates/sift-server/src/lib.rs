//! Sift Web Server
//!
//! Axum-based REST API over the categorization cascade and analytics.
//!
//! - Every request is scoped to the owner named by the `x-owner-id` header
//!   (`default` when absent)
//! - Restrictive CORS policy and security headers
//! - Input validation (pagination limits, upload size limits)
//! - Sanitized error responses: caller mistakes are 400, everything else 500

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use sift_core::analytics::NarrativeWriter;
use sift_core::{AIBackend, AIClient, Cascade, Classifier, Config, Database, ModelStore};

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Header naming the owner a request acts for
pub const OWNER_HEADER: &str = "x-owner-id";

/// Owner used when the header is missing or blank
pub const DEFAULT_OWNER: &str = "default";

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub server: ServerConfig,
    pub ai: Option<AIClient>,
    pub classifier: Classifier,
    pub cascade: Cascade,
    pub narratives: NarrativeWriter,
}

impl AppState {
    /// Build the state with the generative client taken from `config`
    pub fn new(db: Database, config: Config, server: ServerConfig) -> Self {
        let ai = AIClient::from_config(&config);
        Self::with_ai(db, config, server, ai)
    }

    /// Build the state with an explicit generative client (tests inject a mock)
    pub fn with_ai(
        db: Database,
        config: Config,
        server: ServerConfig,
        ai: Option<AIClient>,
    ) -> Self {
        let classifier = Classifier::new(ModelStore::new(&config.model_dir));
        let cascade = Cascade::new(&config, classifier.clone(), ai.clone());
        let narratives = NarrativeWriter::from_config(&config, ai.clone());
        Self {
            db,
            config,
            server,
            ai,
            classifier,
            cascade,
            narratives,
        }
    }
}

/// Owner for this request
pub fn owner_from(headers: &HeaderMap) -> String {
    headers
        .get(OWNER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_OWNER)
        .to_string()
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::get_health))
        // Categorization
        .route("/categorize", post(handlers::categorize))
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/transactions/:id", get(handlers::get_transaction))
        // Ingestion and training
        .route("/import", post(handlers::import_csv))
        .route("/train", post(handlers::train_model))
        // Analytics
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/trend", get(handlers::get_trend))
        .route("/anomalies", get(handlers::get_anomalies))
        .route("/insights", get(handlers::get_insights))
        .route("/summary", get(handlers::get_summary))
        .route("/months/:month", get(handlers::get_month_summary))
        // Budget
        .route(
            "/budget",
            get(handlers::get_budget)
                .put(handlers::set_budget)
                .delete(handlers::clear_budget),
        );

    // Build CORS layer
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let allowed_headers = [
        header::CONTENT_TYPE,
        header::HeaderName::from_static(OWNER_HEADER),
    ];
    let cors = if state.server.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(allowed_headers)
    } else {
        let origins: Vec<HeaderValue> = state
            .server
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(allowed_headers)
    };

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    if let Err(e) = std::fs::create_dir_all(&state.config.model_dir) {
        warn!(
            dir = %state.config.model_dir.display(),
            error = %e,
            "Could not create model directory"
        );
    }

    if state.classifier.is_available() {
        info!("✅ Classifier artifact loaded from {}", state.config.model_dir.display());
    } else {
        info!(
            "ℹ️  No classifier artifact in {} (train one with `sift train`)",
            state.config.model_dir.display()
        );
    }
    check_ai_connection(state.ai.as_ref()).await;

    let app = create_router(Arc::new(state));
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log generative backend status
async fn check_ai_connection(ai: Option<&AIClient>) {
    match ai {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ Generative backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  Generative backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  Generative backend not configured (set GEMINI_API_KEY to enable it)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        // Caller mistakes surface their message as a 400
        if let Some(core) = err.downcast_ref::<sift_core::Error>() {
            if core.is_validation() {
                return Self::bad_request(&core.to_string());
            }
        }
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
