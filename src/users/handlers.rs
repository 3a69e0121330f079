use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        DeletedResponse, LoginRequest, RegisterRequest, TokenResponse, UpdateProfileRequest,
        UserResponse,
    },
    repo_types::ProfileChanges,
    services,
};
use crate::{
    auth::JwtKeys,
    error::ServiceError,
    extractors::{AppJson, AppPath},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route(
        "/users/:id",
        get(get_profile).put(update_profile).delete(delete_profile),
    )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<UserResponse>, ServiceError> {
    let payload = payload.validate()?;
    let user = services::create_user(state.repo.as_ref(), payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    let payload = payload.validate()?;
    let keys = JwtKeys::from_ref(&state);
    let token = services::login_user(state.repo.as_ref(), &keys, payload).await?;
    Ok(Json(token))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<UserResponse>, ServiceError> {
    services::get_user(state.repo.as_ref(), id)
        .await?
        .map(|u| Json(u.into()))
        .ok_or(ServiceError::NotFound)
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ServiceError> {
    let payload = payload.validate()?;
    let changes = ProfileChanges {
        name: payload.name,
        bio: payload.bio,
        avatar_url: payload.avatar_url,
    };
    services::update_user(state.repo.as_ref(), id, changes)
        .await?
        .map(|u| Json(u.into()))
        .ok_or(ServiceError::NotFound)
}

#[instrument(skip(state))]
pub async fn delete_profile(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<DeletedResponse>, ServiceError> {
    if !services::delete_user(state.repo.as_ref(), id).await? {
        return Err(ServiceError::NotFound);
    }
    Ok(Json(DeletedResponse { deleted: true }))
}
