use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::config::{DEFAULT_STATIC_DIR, STATIC_MOUNT};
use crate::{ProgressAggregator, SourceError, TableSource};

pub mod render;

#[derive(Clone)]
pub struct AppState {
    aggregator: ProgressAggregator,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(aggregator: ProgressAggregator) -> Self {
        Self {
            aggregator,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }

    pub fn from_source(source: Arc<dyn TableSource>, completion_column: usize) -> Self {
        Self::new(ProgressAggregator::new(source, completion_column))
    }

    pub fn with_static_dir(mut self, static_dir: impl Into<PathBuf>) -> Self {
        self.static_dir = static_dir.into();
        self
    }

    pub fn aggregator(&self) -> &ProgressAggregator {
        &self.aggregator
    }
}

#[derive(Debug)]
enum ApiError {
    Configuration(String),
    Upstream(String),
}

impl From<SourceError> for ApiError {
    fn from(value: SourceError) -> Self {
        match value {
            SourceError::Configuration(message) => ApiError::Configuration(message),
            SourceError::Upstream(message) => ApiError::Upstream(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            ApiError::Configuration(message) => {
                error!(%message, "service misconfigured");
                format!("configuration error: {message}")
            }
            ApiError::Upstream(message) => {
                error!(%message, "table source failed");
                format!("upstream error: {message}")
            }
        };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(render::error_page(&message)),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.static_dir);
    Router::new()
        .route("/", get(progress_page))
        .nest_service(STATIC_MOUNT, assets)
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("sheet-progress listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

async fn progress_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let snapshot = state.aggregator.refresh().await?;
    Ok(Html(render::progress_page(&snapshot)))
}
