use super::{optional_user, require_user, ApiResult, AppState};
use crate::content::{CommentView, LikeResponse};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use super::ApiError;

pub(crate) async fn list_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
) -> ApiResult<Vec<CommentView>> {
    let viewer = optional_user(&state, &headers)?;
    Ok(Json(state.content().comments(viewer.as_ref(), &post_id)?))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateCommentBody {
    body: String,
    #[serde(default)]
    parent_comment_id: Option<String>,
}

pub(crate) async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    Json(body): Json<CreateCommentBody>,
) -> Result<(StatusCode, Json<CommentView>), ApiError> {
    let caller = require_user(&state, &headers)?;
    let view = state.content().create_comment(
        &caller,
        &post_id,
        &body.body,
        body.parent_comment_id.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<String>,
) -> ApiResult<LikeResponse> {
    let caller = require_user(&state, &headers)?;
    Ok(Json(state.content().toggle_comment_like(&caller, &comment_id)?))
}
