mod comments;
mod experts;
mod images;
mod posts;
mod subscriptions;
mod users;

use crate::auth::AuthService;
use crate::config::VestnikConfig;
use crate::content::ContentService;
use crate::database::models::UserRecord;
use crate::database::Database;
use crate::error::AppError;
use crate::media::MediaService;
use crate::users::UserService;
use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Uploaded images are small; cap request bodies well below anything hostile.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: VestnikConfig,
    pub database: Database,
    pub auth: AuthService,
}

impl AppState {
    fn users(&self) -> UserService {
        UserService::new(self.database.clone(), self.auth.clone())
    }

    fn content(&self) -> ContentService {
        ContentService::new(self.database.clone())
    }

    fn media(&self) -> MediaService {
        MediaService::new(self.config.paths.clone())
    }
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

/// Transport wrapper around the domain error taxonomy.
#[derive(Debug)]
pub struct ApiError(AppError);

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, ErrorResponse) {
        let status = match &self.0 {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        message: "internal server error".into(),
                    },
                );
            }
        };
        (
            status,
            ErrorResponse {
                message: self.0.to_string(),
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(AppError::from(err))
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

/// Extracts the bearer token, treating the literal strings some clients send
/// for "no token" as absent.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() || token == "null" || token == "undefined" {
        None
    } else {
        Some(token)
    }
}

pub(crate) fn require_user(state: &AppState, headers: &HeaderMap) -> Result<UserRecord, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::InvalidCredentials("missing bearer token".into()))?;
    Ok(state.users().authenticate(token)?)
}

pub(crate) fn optional_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<UserRecord>, ApiError> {
    match bearer_token(headers) {
        None => Ok(None),
        Some(token) => Ok(Some(state.users().authenticate(token)?)),
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Tries to bind to the given port, or finds the next available port
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        let port = start_port + offset;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "Port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "Could not find available port in range {}-{}",
        start_port,
        start_port + MAX_PORT_ATTEMPTS - 1
    )
}

pub async fn serve_http(config: VestnikConfig, database: Database) -> Result<()> {
    let auth = AuthService::new(config.auth.clone());
    let state = AppState {
        config: config.clone(),
        database,
        auth,
    };

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/users/signup", post(users::signup))
        .route("/users/login", post(users::login))
        .route("/users/current", get(users::current_user))
        .route("/users/edit", post(users::edit_profile))
        .route("/users/avatar", post(users::upload_avatar))
        .route("/users/notifications", get(users::list_notifications))
        .route("/users/subscriptions", get(subscriptions::list_subscriptions))
        .route("/users/expert_request", get(experts::get_expert_request))
        .route("/users/expert_request", post(experts::submit_expert_request))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/subscriptions", get(subscriptions::list_subscriptions_of))
        .route("/users/:id/subscribe", post(subscriptions::subscribe))
        .route("/users/:id/unsubscribe", post(subscriptions::unsubscribe))
        .route("/users/:id/ban", post(users::ban_user))
        .route("/posts", get(posts::public_feed).post(posts::create_post))
        .route("/posts/queue", get(posts::moderation_queue))
        .route("/posts/:id", get(posts::get_post).delete(posts::delete_post))
        .route("/posts/:id/moderate", post(posts::moderate_post))
        .route("/posts/:id/like", post(posts::toggle_like))
        .route("/posts/:id/view", post(posts::record_view))
        .route("/posts/:id/comments_disabled", post(posts::set_comments_disabled))
        .route("/posts/:id/comments", get(comments::list_comments).post(comments::create_comment))
        .route("/comments/:id/like", post(comments::toggle_like))
        .route("/images/:name", get(images::get_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let (listener, actual_port) = find_available_port(config.api_port).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], actual_port));

    if actual_port != config.api_port {
        tracing::warn!(
            requested_port = config.api_port,
            actual_port = actual_port,
            "Configured port was in use, bound to next available port"
        );
    }

    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
