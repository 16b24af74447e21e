// handlers/protected/courses.rs - GET /api/courses/:id/videos handler

use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::{Identity, Role};
use crate::database::models::{format_duration, Course, Enrollment, Video};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LessonVideo {
    #[serde(flatten)]
    pub video: Video,
    pub duration_formatted: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LessonStats {
    pub total_videos: usize,
    pub total_duration_seconds: i64,
    pub total_duration_formatted: String,
    pub free_videos: usize,
}

pub fn lesson_stats(videos: &[Video]) -> LessonStats {
    let total: i64 = videos.iter().map(|v| v.duration_seconds as i64).sum();
    LessonStats {
        total_videos: videos.len(),
        total_duration_seconds: total,
        total_duration_formatted: format_duration(total),
        free_videos: videos.iter().filter(|v| v.is_free).count(),
    }
}

/**
 * GET /api/courses/:id/videos - Lesson list for a course
 *
 * Students must be enrolled; admins see every course. Videos are ordered by
 * `order_index`, then creation time.
 */
pub async fn course_videos_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(course_id): Path<String>,
) -> ApiResult<Value> {
    let course_id: i32 = course_id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid course ID"))?;

    if !identity.has_role(Role::Admin) && !Enrollment::exists(&state.pool, identity.user_id, course_id).await? {
        return Err(ApiError::forbidden(
            "You must be enrolled in this course to view its content",
        ));
    }

    let course = Course::find(&state.pool, course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    let videos = Video::list_for_course(&state.pool, course_id).await?;
    let stats = lesson_stats(&videos);
    let videos: Vec<LessonVideo> = videos
        .into_iter()
        .map(|video| LessonVideo {
            duration_formatted: format_duration(video.duration_seconds as i64),
            video,
        })
        .collect();

    Ok(ApiResponse::success(json!({
        "course": {
            "id": course.id,
            "title": course.title,
            "description": course.description,
        },
        "videos": videos,
        "stats": stats,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn video(id: i32, seconds: i32, is_free: bool) -> Video {
        Video {
            id,
            course_id: 1,
            title: format!("Lesson {}", id),
            description: None,
            video_url: "https://cdn.example.com/v.mp4".into(),
            thumbnail_url: None,
            duration_seconds: seconds,
            order_index: id,
            is_free,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sums_durations_and_free_lessons() {
        let stats = lesson_stats(&[video(1, 90, true), video(2, 45, false), video(3, 600, false)]);
        assert_eq!(
            stats,
            LessonStats {
                total_videos: 3,
                total_duration_seconds: 735,
                total_duration_formatted: "12:15".into(),
                free_videos: 1,
            }
        );
    }

    #[test]
    fn empty_course_has_zero_stats() {
        let stats = lesson_stats(&[]);
        assert_eq!(stats.total_duration_formatted, "0:00");
        assert_eq!(stats.total_videos, 0);
    }
}
