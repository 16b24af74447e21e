// handlers/elevated/admin/catalog.rs - Course, category and video management

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{non_blank, parse_id, require_admin};
use crate::auth::Identity;
use crate::database::models::{format_duration, Category, Course, CourseInput, Video, VideoInput};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

const DIFFICULTY_LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

#[derive(Debug, Default, Deserialize)]
pub struct CourseRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
}

impl CourseRequest {
    /// Creation requires title, description and category; the rest default
    fn for_create(&self) -> Result<CourseInput, ApiError> {
        let title = non_blank(&self.title).ok_or_else(|| ApiError::bad_request("Title is required"))?;
        let description =
            non_blank(&self.description).ok_or_else(|| ApiError::bad_request("Description is required"))?;
        let category_id = self
            .category_id
            .ok_or_else(|| ApiError::bad_request("Category is required"))?;

        CourseInput {
            title: title.to_string(),
            description: description.to_string(),
            category_id,
            price: self.price.unwrap_or(0.0),
            difficulty_level: non_blank(&self.difficulty_level).unwrap_or("beginner").to_string(),
            is_published: self.is_published.unwrap_or(false),
            duration_minutes: self.duration_minutes.unwrap_or(0),
        }
        .validated()
    }

    /// Replacement requires every field except publication state and duration
    fn for_update(&self) -> Result<CourseInput, ApiError> {
        match (
            non_blank(&self.title),
            non_blank(&self.description),
            self.category_id,
            self.price,
            non_blank(&self.difficulty_level),
        ) {
            (Some(title), Some(description), Some(category_id), Some(price), Some(level)) => CourseInput {
                title: title.to_string(),
                description: description.to_string(),
                category_id,
                price,
                difficulty_level: level.to_string(),
                is_published: self.is_published.unwrap_or(false),
                duration_minutes: self.duration_minutes.unwrap_or(0),
            }
            .validated(),
            _ => Err(ApiError::bad_request(
                "Title, description, category, price and difficulty level are required",
            )),
        }
    }
}

impl CourseInput {
    fn validated(self) -> Result<Self, ApiError> {
        if !DIFFICULTY_LEVELS.contains(&self.difficulty_level.as_str()) {
            return Err(ApiError::bad_request(
                "Difficulty level must be beginner, intermediate or advanced",
            ));
        }
        if self.price < 0.0 || !self.price.is_finite() {
            return Err(ApiError::bad_request("Price must be a non-negative number"));
        }
        if self.duration_minutes < 0 {
            return Err(ApiError::bad_request("Duration must not be negative"));
        }
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub course_id: Option<i32>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<i32>,
    #[serde(default)]
    pub order_index: Option<i32>,
    #[serde(default)]
    pub is_free: Option<bool>,
}

impl VideoRequest {
    fn input(&self) -> Result<VideoInput, ApiError> {
        let (Some(title), Some(course_id), Some(video_url)) =
            (non_blank(&self.title), self.course_id, non_blank(&self.video_url))
        else {
            return Err(ApiError::bad_request("Title, course ID, and video URL are required"));
        };

        Ok(VideoInput {
            course_id,
            title: title.to_string(),
            description: self.description.clone().unwrap_or_default(),
            video_url: video_url.to_string(),
            thumbnail_url: self.thumbnail_url.clone().unwrap_or_default(),
            duration_seconds: self.duration_seconds.unwrap_or(0).max(0),
            order_index: self.order_index.unwrap_or(0),
            is_free: self.is_free.unwrap_or(false),
        })
    }
}

/// GET /api/admin/categories
pub async fn categories_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let categories = Category::list(&state.pool).await?;
    Ok(ApiResponse::success(json!({ "categories": categories })))
}

/// GET /api/admin/courses - Every course, published or not, with stats
pub async fn courses_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let courses = Course::list_with_stats(&state.pool).await?;
    Ok(ApiResponse::success(json!({ "courses": courses })))
}

/// GET /api/admin/courses-list - Id and title pairs for pickers
pub async fn courses_list_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let courses = Course::list_titles(&state.pool).await?;
    Ok(ApiResponse::success(json!({ "courses": courses })))
}

/// POST /api/admin/courses - The calling admin becomes the instructor
pub async fn courses_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CourseRequest>, JsonRejection>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let Json(body) = payload?;
    let input = body.for_create()?;

    let category = Category::find(&state.pool, input.category_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid category ID"))?;

    let course = Course::create(&state.pool, &input, identity.user_id).await?;
    tracing::info!("Admin {} created course {}", identity.user_id, course.id);

    Ok(ApiResponse::created(json!({
        "course": {
            "id": course.id,
            "title": course.title,
            "description": course.description,
            "category": category.name,
            "instructor_id": course.instructor_id,
            "total_videos": 0,
            "enrolled_students": 0,
            "is_published": course.is_published,
            "created_at": course.created_at,
        }
    }))
    .message("Course created successfully"))
}

/// PUT /api/admin/courses/:id
pub async fn course_put(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(course_id): Path<String>,
    payload: Result<Json<CourseRequest>, JsonRejection>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let course_id = parse_id(&course_id, "Invalid course ID")?;
    let Json(body) = payload?;
    let input = body.for_update()?;

    if Category::find(&state.pool, input.category_id).await?.is_none() {
        return Err(ApiError::bad_request("Invalid category ID"));
    }

    let course = Course::update(&state.pool, course_id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    Ok(ApiResponse::success(json!({ "course": course })).message("Course updated successfully"))
}

/// DELETE /api/admin/courses/:id - Cascades to videos and enrollments
pub async fn course_delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(course_id): Path<String>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let course_id = parse_id(&course_id, "Course ID is required")?;

    if !Course::delete(&state.pool, course_id).await? {
        return Err(ApiError::not_found("Course not found"));
    }
    tracing::info!("Admin {} deleted course {}", identity.user_id, course_id);

    Ok(ApiResponse::success(json!({ "id": course_id })).message("Course deleted successfully"))
}

/// GET /api/admin/videos - Every video grouped by course title
pub async fn videos_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let videos: Vec<Value> = Video::list_all(&state.pool)
        .await?
        .into_iter()
        .map(|mut video| {
            if video.course_title.is_none() {
                video.course_title = Some("Unknown Course".to_string());
            }
            json!(video)
        })
        .collect();

    Ok(ApiResponse::success(json!({ "videos": videos })))
}

/// POST /api/admin/videos
pub async fn videos_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let Json(body) = payload?;
    let input = body.input()?;

    let course = Course::find(&state.pool, input.course_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid course ID"))?;

    let video = Video::create(&state.pool, &input).await?;

    Ok(ApiResponse::created(json!({
        "video": {
            "id": video.id,
            "title": video.title,
            "course": course.title,
            "duration": format_duration(video.duration_seconds as i64),
            "upload_date": video.created_at,
            "status": "published",
        }
    }))
    .message("Video created successfully"))
}

/// PUT /api/admin/videos/:id
pub async fn video_put(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(video_id): Path<String>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let video_id = parse_id(&video_id, "Invalid video ID")?;
    let Json(body) = payload?;
    let input = body.input()?;

    if !Video::exists(&state.pool, video_id).await? {
        return Err(ApiError::not_found("Video not found"));
    }
    if Course::find(&state.pool, input.course_id).await?.is_none() {
        return Err(ApiError::bad_request("Invalid course ID"));
    }

    let video = Video::update(&state.pool, video_id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    Ok(ApiResponse::success(json!({ "video": video })).message("Video updated successfully"))
}

/// DELETE /api/admin/videos/:id
pub async fn video_delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(video_id): Path<String>,
) -> ApiResult<Value> {
    require_admin(&identity)?;
    let video_id = parse_id(&video_id, "Invalid video ID")?;

    if !Video::delete(&state.pool, video_id).await? {
        return Err(ApiError::not_found("Video not found"));
    }

    Ok(ApiResponse::success(json!({ "id": video_id })).message("Video deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_creation_defaults() {
        let request = CourseRequest {
            title: Some("Rust".into()),
            description: Some("Systems programming".into()),
            category_id: Some(2),
            ..Default::default()
        };
        let input = request.for_create().unwrap();
        assert_eq!(input.price, 0.0);
        assert_eq!(input.difficulty_level, "beginner");
        assert!(!input.is_published);
    }

    #[test]
    fn course_creation_reports_first_missing_field() {
        let request = CourseRequest {
            title: Some("Rust".into()),
            description: Some(" ".into()),
            ..Default::default()
        };
        assert_eq!(request.for_create().unwrap_err().message(), "Description is required");
    }

    #[test]
    fn course_update_requires_price_and_level() {
        let request = CourseRequest {
            title: Some("Rust".into()),
            description: Some("d".into()),
            category_id: Some(1),
            ..Default::default()
        };
        assert_eq!(request.for_update().unwrap_err().status_code(), 400);

        let request = CourseRequest {
            price: Some(19.5),
            difficulty_level: Some("expert".into()),
            ..request
        };
        assert!(request.for_update().is_err());
    }

    #[test]
    fn video_requires_title_course_and_url() {
        let request = VideoRequest {
            title: Some("Intro".into()),
            course_id: Some(1),
            ..Default::default()
        };
        assert!(request.input().is_err());

        let request = VideoRequest {
            video_url: Some("https://cdn.example.com/intro.mp4".into()),
            ..request
        };
        let input = request.input().unwrap();
        assert_eq!(input.duration_seconds, 0);
        assert_eq!(input.description, "");
    }
}
