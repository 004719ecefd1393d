//! HTTP API for the toaster.
//!
//! `POST {prefix}/upload-audio` takes a multipart WAV clip, `POST
//! {prefix}/command` takes typed text, `GET /status` is a liveness probe.

use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::intent::Command;
use crate::pipeline::{ToasterPipeline, ToasterReply};
use crate::upload::UploadedAudio;
use crate::Error;

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<ToasterPipeline>,
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct CommandRequest {
    text: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyBody {
    pub message: String,
    pub command: Command,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_mime: Option<String>,
}

impl From<ToasterReply> for ReplyBody {
    fn from(reply: ToasterReply) -> Self {
        let (audio_base64, audio_mime) = match reply.audio {
            Some(audio) => (Some(BASE64.encode(&audio.bytes)), Some(audio.mime)),
            None => (None, None),
        };
        Self {
            message: reply.message,
            command: reply.command,
            audio_base64,
            audio_mime,
        }
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    version: &'static str,
    synthesis: bool,
}

/// Error surface: `{"detail": "..."}` with 400 or 500, or the status the
/// multipart reader picked (413 for oversized bodies).
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Processing(String),
    Upload(StatusCode, String),
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::Upload(e.status(), format!("failed to read upload: {}", e.body_text()))
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        if e.is_client_error() {
            Self::BadRequest(e.to_string())
        } else {
            Self::Processing(format!("Error processing audio: {e}"))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            detail: String,
        }

        let (status, detail) = match self {
            Self::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            Self::Processing(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail),
            Self::Upload(status, detail) => (status, detail),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Build the axum router.
pub fn router(state: ApiState, server: &ServerConfig) -> Router {
    let routes = Router::new()
        .route("/upload-audio", post(handle_upload))
        .route("/command", post(handle_command));

    let prefix = server.route_prefix.trim_end_matches('/');
    let routes = if prefix.is_empty() {
        routes
    } else if prefix.starts_with('/') {
        Router::new().nest(prefix, routes)
    } else {
        Router::new().nest(&format!("/{prefix}"), routes)
    };

    Router::new()
        .route("/status", get(handle_status))
        .merge(routes)
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
///
/// # Errors
///
/// Returns error if the address cannot be bound or the server fails
pub async fn serve(state: ApiState, server: &ServerConfig) -> std::io::Result<()> {
    let app = router(state, server);
    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "Toaster API listening on {addr} (upload: {}/upload-audio)",
        server.route_prefix.trim_end_matches('/')
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await
}

// --- Handlers ---

async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        synthesis: state.pipeline.has_synthesis(),
    })
}

async fn handle_upload(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<Json<ReplyBody>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await?;
        upload = Some(UploadedAudio::new(bytes.to_vec(), content_type, filename));
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest("no file in upload".into()))?;
    info!(
        "HTTP /upload-audio: {} ({} bytes, {})",
        upload.filename.as_deref().unwrap_or("<unnamed>"),
        upload.bytes.len(),
        upload.content_type.as_deref().unwrap_or("no content type"),
    );

    match state.pipeline.handle_upload(upload).await {
        Ok(reply) => Ok(Json(reply.into())),
        Err(e) => {
            if !e.is_client_error() {
                error!("Upload failed: {e}");
            }
            Err(e.into())
        }
    }
}

async fn handle_command(
    State(state): State<ApiState>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<ReplyBody>, ApiError> {
    let reply = state.pipeline.handle_text(&req.text).await?;
    Ok(Json(reply.into()))
}
