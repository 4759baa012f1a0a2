use crate::{
    auth::AuthUser,
    models::{NewUserRequest, UserProfile},
    utils::ApiResult,
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};

/// Return the currently authenticated user
pub async fn current_user(Extension(auth_user): Extension<AuthUser>) -> Json<UserProfile> {
    Json(auth_user.into())
}

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let registration = request.validated()?;

    state.auth_service.register(registration).await?;

    Ok((StatusCode::CREATED, [(header::LOCATION, "/")]))
}
