//! HTTP API consumed by the roster front end.

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::error::SyncError;
use crate::store::UserUpdate;
use crate::sync::Syncer;

#[derive(Clone)]
pub struct AppState {
    syncer: Arc<Syncer>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(syncer: Syncer, shutdown: CancellationToken) -> Self {
        Self {
            syncer: Arc::new(syncer),
            shutdown,
        }
    }
}

/// Maps sync failures onto HTTP statuses with a `{"error": ...}` body.
pub struct AppError(SyncError);

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SyncError::Validation(_) => StatusCode::BAD_REQUEST,
            SyncError::NotFound { .. } => StatusCode::NOT_FOUND,
            SyncError::AuthorizationFailed { .. } => StatusCode::FORBIDDEN,
            SyncError::FetchFailed { .. } | SyncError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            SyncError::Cancelled { .. } | SyncError::DeadlineExceeded { .. } => {
                StatusCode::GATEWAY_TIMEOUT
            }
            SyncError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if self.0.is_client_error() {
            warn!(error = %self.0, "request rejected");
        } else {
            error!(error = %self.0, %status, "request failed");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

fn bad_request(message: String) -> Response {
    warn!(%message, "bad request");
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/initialize-users", post(initialize_users))
        .route("/api/initialize-channels", post(initialize_channels))
        .route("/api/users", get(list_users))
        .route("/api/users/:id", put(update_user))
        .route("/api/channels", get(list_channels))
        .route(
            "/api/initialize-channel-conversations/:channel_id",
            get(initialize_channel_conversations),
        )
        .route("/api/history/:channel_id", get(stored_history))
        .with_state(state)
}

/// Serves until `shutdown` is cancelled.
pub async fn serve(
    syncer: Syncer,
    bind: SocketAddr,
    cors_origin: &str,
    shutdown: CancellationToken,
) -> Result<()> {
    let origin: HeaderValue = cors_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin '{}'", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    let app = router(AppState::new(syncer, shutdown.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    info!(%bind, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server error")?;

    info!("server stopped");
    Ok(())
}

async fn initialize_users(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let count = state.syncer.initialize_users().await?;
    Ok(Json(json!({
        "message": "Users initialized successfully",
        "count": count,
    })))
}

async fn initialize_channels(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let count = state.syncer.initialize_channels().await?;
    Ok(Json(json!({
        "message": "Channels initialized successfully",
        "count": count,
    })))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let users = state.syncer.get_all_users().await?;
    Ok(Json(json!({ "users": users })))
}

async fn list_channels(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let channels = state.syncer.get_all_channels().await?;
    Ok(Json(json!({ "channels": channels })))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UserUpdate>, JsonRejection>,
) -> Response {
    let Ok(id) = id.parse::<i32>() else {
        return bad_request(format!("Invalid user ID format: {}", id));
    };

    let user = match body {
        Ok(Json(user)) => user,
        Err(rejection) => return bad_request(format!("Invalid request body: {}", rejection.body_text())),
    };

    match state.syncer.update_user(id, user).await {
        Ok(()) => Json(json!({
            "message": format!("User with id {} updated successfully", id),
        }))
        .into_response(),
        Err(e) => AppError(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    #[serde(default)]
    save: bool,
}

async fn initialize_channel_conversations(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Value>, AppError> {
    info!(channel = %channel_id, save = params.save, "initializing channel conversations");

    let cancel = state.shutdown.child_token();
    let messages = if params.save {
        state.syncer.save_channel_conversations(&channel_id, &cancel).await?
    } else {
        state
            .syncer
            .initialize_channel_conversations(&channel_id, &cancel)
            .await?
    };

    Ok(Json(json!({
        "message": "Channel conversations initialized successfully",
        "channel_id": channel_id,
        "status": "success",
        "messages": messages,
    })))
}

async fn stored_history(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let messages = state.syncer.stored_conversations(&channel_id).await?;
    Ok(Json(json!({
        "channel_id": channel_id,
        "messages": messages,
    })))
}
