// handlers/protected/user.rs - Enrollment handlers for the signed-in user

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::database::models::{Course, Enrollment};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    #[serde(default, rename = "courseId")]
    pub course_id: Option<i32>,
}

/// POST /api/user/enroll - Enroll in a published course. Payment is simulated.
pub async fn enroll_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<EnrollRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(body) = payload?;
    let course_id = body
        .course_id
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request("Course ID is required"))?;

    if Enrollment::exists(&state.pool, identity.user_id, course_id).await? {
        return Err(ApiError::bad_request("User is already enrolled in this course"));
    }

    let course = Course::find_published(&state.pool, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found or not available"))?;

    let enrollment_id = Enrollment::create(&state.pool, identity.user_id, course_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("User is already enrolled in this course"))?;

    tracing::info!("User {} enrolled in course {}", identity.user_id, course_id);

    Ok(ApiResponse::success(json!({
        "enrollmentId": enrollment_id,
        "courseTitle": course.title,
    }))
    .message("Successfully enrolled in course"))
}

/// GET /api/user/enrolled-courses - The user's enrollments with progress
pub async fn enrolled_courses_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Value> {
    let courses = Course::enrolled_for_user(&state.pool, identity.user_id).await?;

    Ok(ApiResponse::success(json!({
        "total": courses.len(),
        "courses": courses,
    })))
}
