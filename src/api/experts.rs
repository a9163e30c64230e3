use super::{require_user, ApiResult, AppState};
use crate::users::ExpertRequestView;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

pub(crate) async fn get_expert_request(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<ExpertRequestView> {
    let caller = require_user(&state, &headers)?;
    Ok(Json(state.users().expert_request(&caller.id)?))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExpertRequestBody {
    status: bool,
    #[serde(default)]
    tags: Vec<String>,
}

pub(crate) async fn submit_expert_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ExpertRequestBody>,
) -> ApiResult<ExpertRequestView> {
    let caller = require_user(&state, &headers)?;
    Ok(Json(
        state
            .users()
            .set_expert_request(&caller.id, body.status, &body.tags)?,
    ))
}
