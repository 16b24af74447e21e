use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Video {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: i32,
    pub order_index: i32,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin listing row with the owning course title
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VideoSummary {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub course_id: i32,
    pub course_title: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: i32,
    pub order_index: i32,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VideoInput {
    pub course_id: i32,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_seconds: i32,
    pub order_index: i32,
    pub is_free: bool,
}

/// `M:SS`, minutes unbounded
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

const VIDEO_COLUMNS: &str = "id, course_id, title, description, video_url, thumbnail_url, \
     duration_seconds, order_index, is_free, created_at, updated_at";

impl Video {
    pub async fn list_for_course(pool: &PgPool, course_id: i32) -> Result<Vec<Video>, sqlx::Error> {
        sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos WHERE course_id = $1 ORDER BY order_index ASC, created_at ASC",
            VIDEO_COLUMNS
        ))
        .bind(course_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<VideoSummary>, sqlx::Error> {
        sqlx::query_as::<_, VideoSummary>(
            r#"
            SELECT v.id, v.title, v.description, v.course_id, c.title AS course_title,
                   v.video_url, v.thumbnail_url, v.duration_seconds, v.order_index,
                   v.is_free, v.created_at
            FROM videos v
            LEFT JOIN courses c ON v.course_id = c.id
            ORDER BY c.title, v.order_index, v.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn exists(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn create(pool: &PgPool, input: &VideoInput) -> Result<Video, sqlx::Error> {
        sqlx::query_as::<_, Video>(&format!(
            r#"
            INSERT INTO videos (course_id, title, description, video_url, thumbnail_url,
                                duration_seconds, order_index, is_free)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        ))
        .bind(input.course_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.video_url)
        .bind(&input.thumbnail_url)
        .bind(input.duration_seconds)
        .bind(input.order_index)
        .bind(input.is_free)
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: i32, input: &VideoInput) -> Result<Option<Video>, sqlx::Error> {
        sqlx::query_as::<_, Video>(&format!(
            r#"
            UPDATE videos
            SET course_id = $1, title = $2, description = $3, video_url = $4, thumbnail_url = $5,
                duration_seconds = $6, order_index = $7, is_free = $8, updated_at = CURRENT_TIMESTAMP
            WHERE id = $9
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        ))
        .bind(input.course_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.video_url)
        .bind(&input.thumbnail_url)
        .bind(input.duration_seconds)
        .bind(input.order_index)
        .bind(input.is_free)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
