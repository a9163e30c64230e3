use super::{require_user, ApiResult, AppState};
use crate::users::SubscriptionView;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct SubscriptionChange {
    subscribed: bool,
}

pub(crate) async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<SubscriptionChange> {
    let caller = require_user(&state, &headers)?;
    state.users().subscribe(&caller.id, &id)?;
    Ok(Json(SubscriptionChange { subscribed: true }))
}

pub(crate) async fn unsubscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<SubscriptionChange> {
    let caller = require_user(&state, &headers)?;
    state.users().unsubscribe(&caller.id, &id)?;
    Ok(Json(SubscriptionChange { subscribed: false }))
}

pub(crate) async fn list_subscriptions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<SubscriptionView>> {
    let caller = require_user(&state, &headers)?;
    Ok(Json(state.users().subscriptions(&caller.id)?))
}

/// Who an arbitrary user follows; public, no auth required.
pub(crate) async fn list_subscriptions_of(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<SubscriptionView>> {
    Ok(Json(state.users().subscriptions(&id)?))
}
