use super::{ApiError, AppState};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};

pub(crate) async fn get_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let Some((bytes, mime)) = state.media().open_image(&name).await? else {
        return Err(AppError::NotFound(format!("image {name} not found")).into());
    };
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(mime));
    Ok((headers, bytes).into_response())
}
