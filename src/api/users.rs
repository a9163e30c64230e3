use super::{optional_user, require_user, ApiError, ApiResult, AppState};
use crate::database::models::ProfileUpdate;
use crate::error::AppError;
use crate::users::{
    AuthResponse, NotificationView, ProfileView, SignupRequest, UserView,
};
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct SignupBody {
    email: String,
    password: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    surname: String,
    #[serde(default)]
    patronymic: String,
    #[serde(default)]
    birthday: String,
    #[serde(default)]
    phone_number: Option<String>,
}

pub(crate) async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupBody>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let response = state.users().signup(SignupRequest {
        email: body.email,
        password: body.password,
        name: body.name,
        surname: body.surname,
        patronymic: body.patronymic,
        birthday: body.birthday,
        phone_number: body.phone_number,
    })?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    email: String,
    password: String,
}

pub(crate) async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<AuthResponse> {
    let response = state.users().login(&body.email, &body.password)?;
    Ok(Json(response))
}

pub(crate) async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<ProfileView> {
    let caller = require_user(&state, &headers)?;
    Ok(Json(ProfileView::from_record(&caller)))
}

pub(crate) async fn edit_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<ProfileView> {
    let caller = require_user(&state, &headers)?;
    let profile = state.users().edit_profile(&caller.id, &update)?;
    Ok(Json(profile))
}

#[derive(Debug, Serialize)]
pub(crate) struct AvatarResponse {
    avatar_url: String,
}

pub(crate) async fn upload_avatar(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<AvatarResponse> {
    let caller = require_user(&state, &headers)?;

    let mut image_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| anyhow::Error::new(err))?
    {
        if matches!(field.name(), Some("file") | Some("image")) {
            let bytes = field.bytes().await.map_err(|err| anyhow::Error::new(err))?;
            image_bytes = Some(bytes.to_vec());
            break;
        }
    }
    let data =
        image_bytes.ok_or_else(|| AppError::Validation("missing image field".into()))?;

    let name = state.media().store_image(&data).await?;
    let avatar_url = state.users().set_avatar(&caller.id, &name)?;
    Ok(Json(AvatarResponse { avatar_url }))
}

pub(crate) async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<NotificationView>> {
    let caller = require_user(&state, &headers)?;
    Ok(Json(state.users().notifications(&caller.id)?))
}

pub(crate) async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<UserView> {
    // Auth is optional here; a valid token for a banned account still fails.
    optional_user(&state, &headers)?;
    Ok(Json(state.users().get_user(&id)?))
}

#[derive(Debug, Serialize)]
pub(crate) struct BanResponse {
    banned: bool,
}

pub(crate) async fn ban_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<BanResponse> {
    let caller = require_user(&state, &headers)?;
    state.users().ban(&caller, &id)?;
    Ok(Json(BanResponse { banned: true }))
}
