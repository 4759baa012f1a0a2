use crate::{
    auth::{mutate_owned_course, ownership::COURSE_NOT_FOUND_MESSAGE, AuthUser, Mutation},
    models::{CourseId, CoursePatch, CourseRequest, CourseResponse, NewCourse},
    utils::{ApiError, ApiResult},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};

/// Ids that are not positive integers can never match a course.
fn parse_course_id(raw: &str) -> ApiResult<CourseId> {
    raw.parse::<CourseId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::not_found_error(COURSE_NOT_FOUND_MESSAGE))
}

/// List every course with its owner
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<Vec<CourseResponse>>> {
    let courses = state.db.list_courses_with_owners().await?;

    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

/// Fetch a single course with its owner
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CourseResponse>> {
    let id = parse_course_id(&id)?;

    state
        .db
        .find_course_with_owner(id)
        .await?
        .map(|course| Json(course.into()))
        .ok_or_else(|| ApiError::not_found_error(COURSE_NOT_FOUND_MESSAGE))
}

/// Create a course owned by the authenticated user
pub async fn create_course(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<CourseRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let fields = request.validated()?;

    let course = state
        .db
        .create_course(NewCourse {
            user_id: auth_user.id,
            fields,
        })
        .await?;

    tracing::info!(course_id = course.id, user_id = auth_user.id, "Course created");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/courses/{}", course.id))],
    ))
}

/// Update a course; owner only
pub async fn update_course(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<CoursePatch>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let id = parse_course_id(&id)?;
    let Json(patch) = payload?;

    mutate_owned_course(state.db.as_ref(), id, &auth_user, Mutation::Update(patch)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a course; owner only
pub async fn delete_course(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_course_id(&id)?;

    mutate_owned_course(state.db.as_ref(), id, &auth_user, Mutation::Delete).await?;

    tracing::info!(course_id = id, user_id = auth_user.id, "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}
