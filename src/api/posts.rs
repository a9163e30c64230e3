use super::{optional_user, require_user, ApiError, ApiResult, AppState};
use crate::content::{FeedQuery, LikeResponse, ModerationInput, NewPost, PostView};
use crate::database::repositories::PostRepository;
use crate::error::AppError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct FeedParams {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    category_id: Option<i64>,
    #[serde(default)]
    author_id: Option<String>,
    #[serde(default)]
    offset: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
}

impl FeedParams {
    fn into_query(self) -> FeedQuery {
        FeedQuery {
            search: self.search,
            category_id: self.category_id,
            author_id: self.author_id,
            offset: self.offset.unwrap_or(0),
            limit: self.limit,
        }
    }
}

pub(crate) async fn public_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FeedParams>,
) -> ApiResult<Vec<PostView>> {
    let viewer = optional_user(&state, &headers)?;
    let feed = state.content().feed(viewer.as_ref(), &params.into_query())?;
    Ok(Json(feed))
}

pub(crate) async fn moderation_queue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FeedParams>,
) -> ApiResult<Vec<PostView>> {
    let caller = require_user(&state, &headers)?;
    let queue = state
        .content()
        .moderation_queue(&caller, &params.into_query())?;
    Ok(Json(queue))
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ApiError> {
    match raw.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::Validation(format!("{name} must be a boolean")).into()),
    }
}

fn parse_i64(name: &str, raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{name} must be an integer")).into())
}

/// Comma-separated list, empty entries dropped.
fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_category_ids(raw: &str) -> Result<Vec<i64>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| parse_i64("category_ids", id))
        .collect()
}

pub(crate) async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let caller = require_user(&state, &headers)?;

    let mut title = None;
    let mut body = None;
    let mut source = None;
    let mut tags = Vec::new();
    let mut category_ids = Vec::new();
    let mut image_bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| anyhow::Error::new(err))?
    {
        match field.name() {
            Some("title") => title = Some(field.text().await.map_err(|err| anyhow::Error::new(err))?),
            Some("body") => body = Some(field.text().await.map_err(|err| anyhow::Error::new(err))?),
            Some("source") => {
                source = Some(field.text().await.map_err(|err| anyhow::Error::new(err))?)
            }
            Some("tags") => {
                tags = split_tags(&field.text().await.map_err(|err| anyhow::Error::new(err))?)
            }
            Some("category_ids") => {
                category_ids = split_category_ids(
                    &field.text().await.map_err(|err| anyhow::Error::new(err))?,
                )?
            }
            Some("image") => {
                let bytes = field.bytes().await.map_err(|err| anyhow::Error::new(err))?;
                if !bytes.is_empty() {
                    image_bytes = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    let title = title.ok_or_else(|| AppError::Validation("missing title field".into()))?;
    let body = body.ok_or_else(|| AppError::Validation("missing body field".into()))?;
    let image_name = match image_bytes {
        Some(data) => Some(state.media().store_image(&data).await?),
        None => None,
    };

    let view = state.content().create_post(
        &caller,
        NewPost {
            title,
            body,
            source: source.filter(|text| !text.trim().is_empty()),
            tags,
            category_ids,
            image_name,
        },
    )?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<PostView> {
    let viewer = optional_user(&state, &headers)?;
    Ok(Json(state.content().get_post(viewer.as_ref(), &id)?))
}

pub(crate) async fn moderate_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<PostView> {
    let caller = require_user(&state, &headers)?;

    let mut input = ModerationInput::default();
    let mut image_bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| anyhow::Error::new(err))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "image" {
            let bytes = field.bytes().await.map_err(|err| anyhow::Error::new(err))?;
            if !bytes.is_empty() {
                image_bytes = Some(bytes.to_vec());
            }
            continue;
        }
        let text = field.text().await.map_err(|err| anyhow::Error::new(err))?;
        match name.as_str() {
            "approved" => input.approved = parse_bool("approved", &text)?,
            "publish_after" => input.publish_after = Some(parse_i64("publish_after", &text)?),
            "title" => input.title = Some(text),
            "body" => input.body = Some(text),
            "source" => input.source = Some(text),
            "tags" => input.tags = Some(split_tags(&text)),
            "category_ids" => input.category_ids = Some(split_category_ids(&text)?),
            "likes" => input.likes = Some(parse_i64("likes", &text)?),
            "views" => input.views = Some(parse_i64("views", &text)?),
            "publication_time" => {
                input.publication_time = Some(parse_i64("publication_time", &text)?)
            }
            _ => {}
        }
    }

    // A replacement image orphans the stored one; remember it so the file
    // can be removed once the review goes through.
    let mut previous_image = None;
    if let Some(data) = image_bytes {
        previous_image = state
            .database
            .with_repositories(|repos| Ok(repos.posts().get(&id)?.and_then(|p| p.image_name)))?;
        input.image_name = Some(state.media().store_image(&data).await?);
    }

    let view = state.content().moderate(&caller, &id, input)?;
    if let Some(image_name) = previous_image {
        if let Err(err) = state.media().remove_image(&image_name).await {
            tracing::warn!(error = ?err, image = %image_name, "failed to remove replaced image");
        }
    }
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteResponse {
    deleted: bool,
}

pub(crate) async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<DeleteResponse> {
    let caller = require_user(&state, &headers)?;
    if let Some(image_name) = state.content().delete_post(&caller, &id)? {
        if let Err(err) = state.media().remove_image(&image_name).await {
            tracing::warn!(error = ?err, image = %image_name, "failed to remove orphaned image");
        }
    }
    Ok(Json(DeleteResponse { deleted: true }))
}

pub(crate) async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<LikeResponse> {
    let caller = require_user(&state, &headers)?;
    Ok(Json(state.content().toggle_like(&caller, &id)?))
}

#[derive(Debug, Serialize)]
pub(crate) struct ViewResponse {
    views: i64,
}

pub(crate) async fn record_view(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<ViewResponse> {
    let viewer = optional_user(&state, &headers)?;
    let views = state.content().record_view(viewer.as_ref(), &id)?;
    Ok(Json(ViewResponse { views }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentsDisabledBody {
    disabled: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentsDisabledResponse {
    comments_disabled: bool,
}

pub(crate) async fn set_comments_disabled(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CommentsDisabledBody>,
) -> ApiResult<CommentsDisabledResponse> {
    let caller = require_user(&state, &headers)?;
    state
        .content()
        .set_comments_disabled(&caller, &id, body.disabled)?;
    Ok(Json(CommentsDisabledResponse {
        comments_disabled: body.disabled,
    }))
}
