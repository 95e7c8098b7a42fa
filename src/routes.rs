use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::HeaderMap,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, warn};

use crate::caption::refine_caption;
use crate::config::Config;
use crate::error::ApiError;
use crate::history::{HistoryLog, HistoryRecord};
use crate::inference::InferenceClient;
use crate::storage::ImageStore;
use crate::validate::validate;

/// Frames are full-quality JPEG data URLs, well past axum's 2 MiB default.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub struct AppState {
    pub config: Config,
    pub inference: InferenceClient,
    pub images: ImageStore,
    pub history: HistoryLog,
}

impl AppState {
    pub fn new(config: Config) -> reqwest::Result<Self> {
        let inference =
            InferenceClient::new(&config.ollama_api_url, &config.model, config.upstream_timeout)?;
        let images = ImageStore::new(config.images_dir.clone());
        let history = HistoryLog::new(config.history_file());

        Ok(Self {
            config,
            inference,
            images,
            history,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CaptionResponse {
    pub caption: String,
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(index))
        .route("/api/caption", post(caption_frame))
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../templates/index.html"))
}

async fn caption_frame(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<CaptionResponse>, ApiError> {
    let body = body.map_err(|e| {
        error!("Could not read caption request body: {e}");
        e
    })?;
    let request = validate(&headers, &body).map_err(|e| {
        error!("Rejected caption request: {e}");
        e
    })?;

    let image_filename = match state.images.save(&request.image_data).await {
        Ok(filename) => Some(filename),
        Err(e) => {
            warn!("Error saving image: {e}");
            None
        }
    };

    let raw = state
        .inference
        .generate(&request.prompt, &request.image_data)
        .await?;
    let caption = refine_caption(&raw, &request.prompt);

    let record = HistoryRecord::now(&request.prompt, &caption, image_filename);
    if let Err(e) = state.history.append(&record).await {
        error!(
            "Error saving caption history to {}: {e}",
            state.history.path().display()
        );
    }

    Ok(Json(CaptionResponse { caption }))
}
