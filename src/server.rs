use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use eyre::Result;
use log::{debug, error, info, warn};
use serde::Deserialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::output::{self, Format, TranscriptResponse};
use crate::rate_limit::{Decision, RateLimiter};
use crate::youtube::{self, TranscriptError};
use crate::{extract_video_id, is_youtube_url};

/// Shared state, built once at startup and handed to every request
pub struct AppState {
    pub client: reqwest::Client,
    pub limiter: RateLimiter,
    pub youtube_base_url: String,
    pub default_lang: String,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            limiter: RateLimiter::new(config.rate_limit),
            youtube_base_url: config.youtube_base_url.clone(),
            default_lang: config.default_lang.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub url: String,
    #[serde(default)]
    pub format: Format,
    pub lang: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    RateLimited(String),
    #[error("{}", .0.body_text())]
    InvalidRequest(#[from] JsonRejection),
    #[error("Invalid YouTube URL format")]
    InvalidUrl,
    #[error("No transcript available for this video: {0}")]
    NoTranscript(TranscriptError),
    #[error("Failed to retrieve transcript: {0}")]
    Transcript(TranscriptError),
}

impl From<TranscriptError> for ApiError {
    fn from(e: TranscriptError) -> Self {
        match &e {
            TranscriptError::NoTranscript(_) => ApiError::NoTranscript(e),
            _ => ApiError::Transcript(e),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InvalidRequest(rejection) => rejection.status(),
            ApiError::InvalidUrl => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NoTranscript(_) | ApiError::Transcript(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// Identifier used to bucket rate limit state for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| *addr);
        Ok(ClientId(client_id(&parts.headers, peer)))
    }
}

/// First non-empty `X-Forwarded-For` entry, else the peer IP
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

async fn enforce_rate_limit(
    State(state): State<Arc<AppState>>,
    ClientId(client): ClientId,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match state.limiter.check(&client, Instant::now()) {
        Decision::Allowed => {
            debug!("Request allowed for client: {client}");
            Ok(next.run(request).await)
        }
        Decision::Rejected => {
            warn!("Rate limit exceeded for client: {client}");
            Err(ApiError::RateLimited(state.limiter.rejection_message()))
        }
    }
}

async fn download_transcript(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.inspect_err(|e| warn!("Rejected request body: {}", e.body_text()))?;
    info!("Transcript download requested for: {}", req.url);

    let video_id = is_youtube_url(&req.url)
        .then(|| extract_video_id(&req.url))
        .flatten()
        .ok_or(ApiError::InvalidUrl)?;
    info!("Extracted video ID: {video_id} from URL: {}", req.url);

    let lang = req.lang.as_deref().unwrap_or(&state.default_lang);
    let transcript = youtube::fetch_captions_with_retry(&state.client, &state.youtube_base_url, &video_id, lang)
        .await
        .inspect_err(|e| error!("Failed to get transcript for {video_id}: {e}"))?;
    let metadata = youtube::fetch_metadata(&state.client, &state.youtube_base_url, &video_id).await;
    info!(
        "Successfully retrieved transcript for video ID: {video_id} ({} segments)",
        transcript.segments.len()
    );

    let response = match req.format {
        Format::Json => Json(TranscriptResponse::new(&req.url, &transcript, &metadata)).into_response(),
        Format::Text => output::render_text(&transcript, &metadata).into_response(),
        Format::Plain => output::render_plain(&transcript).into_response(),
    };
    Ok(response)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let limited = Router::new()
        .route("/api/download-transcript", post(download_transcript))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), enforce_rate_limit));

    Router::new()
        .route("/health", get(health_handler))
        .merge(limited)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Periodically drop clients whose windows have fully expired
pub fn spawn_sweeper(state: Arc<AppState>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = state.limiter.sweep(Instant::now());
            if removed > 0 {
                debug!("Swept {removed} idle clients, {} tracked", state.limiter.tracked_clients());
            }
        }
    })
}

pub async fn serve(config: &Config) -> Result<()> {
    let state = Arc::new(AppState::new(config)?);

    let limits = *state.limiter.config();
    if limits.sweep_interval_secs > 0 {
        spawn_sweeper(Arc::clone(&state), Duration::from_secs(limits.sweep_interval_secs));
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Transcript service listening on http://{addr}");
    info!(
        "Rate limit: {} requests per {} seconds",
        limits.call_limit, limits.window_seconds
    );

    let app = router(state);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
