use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::auth::UserId;

/// Catalog ordering selected by the `sortBy` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogSort {
    PriceLow,
    PriceHigh,
    Rating,
    Popularity,
    Newest,
}

impl CatalogSort {
    /// Missing means popularity; an unrecognized value falls back to newest first
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None => Self::Popularity,
            Some("price-low") => Self::PriceLow,
            Some("price-high") => Self::PriceHigh,
            Some("rating") => Self::Rating,
            Some("popularity") => Self::Popularity,
            Some(_) => Self::Newest,
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            Self::PriceLow => " ORDER BY c.price ASC, c.id ASC",
            Self::PriceHigh => " ORDER BY c.price DESC, c.id ASC",
            // No ratings are collected yet
            Self::Rating | Self::Newest => " ORDER BY c.created_at DESC, c.id DESC",
            Self::Popularity => " ORDER BY students DESC, c.created_at DESC",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    pub level: Option<String>,
    pub category: Option<String>,
}

impl CatalogFilter {
    fn active(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty() && *v != "all")
    }
}

/// Published course with aggregate stats, as the catalog query returns it
#[derive(Debug, Clone, FromRow)]
pub struct CatalogRow {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub level: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub total_videos: i64,
    pub total_seconds: i64,
    pub students: i64,
}

/// Admin console listing row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseSummary {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub category: Option<String>,
    pub price: f64,
    pub difficulty_level: String,
    pub is_published: bool,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub total_videos: i64,
    pub enrolled_students: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub instructor_id: Option<i32>,
    pub price: f64,
    pub difficulty_level: String,
    pub is_published: bool,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseTitle {
    pub id: i32,
    pub title: String,
}

/// Field values for creating or replacing a course
#[derive(Debug, Clone)]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    pub category_id: i32,
    pub price: f64,
    pub difficulty_level: String,
    pub is_published: bool,
    pub duration_minutes: i32,
}

/// A student's enrollment joined with course details and progress counts
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EnrolledCourse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub price: f64,
    pub level: String,
    pub category: Option<String>,
    pub duration_minutes: i32,
    pub enrolled_at: DateTime<Utc>,
    pub progress_percentage: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_videos: i64,
    pub completed_videos: i64,
}

const COURSE_COLUMNS: &str = "id, title, description, category_id, instructor_id, price::float8 AS price, \
     difficulty_level, is_published, duration_minutes, created_at, updated_at";

impl Course {
    pub async fn catalog(
        pool: &PgPool,
        filter: &CatalogFilter,
        sort: CatalogSort,
    ) -> Result<Vec<CatalogRow>, sqlx::Error> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT c.id, c.title, c.description, c.price::float8 AS price,
                   c.difficulty_level AS level, cat.name AS category, c.created_at,
                   COALESCE(v.total_videos, 0) AS total_videos,
                   COALESCE(v.total_seconds, 0) AS total_seconds,
                   COALESCE(e.students, 0) AS students
            FROM courses c
            LEFT JOIN categories cat ON c.category_id = cat.id
            LEFT JOIN (
                SELECT course_id, COUNT(*) AS total_videos, SUM(duration_seconds)::int8 AS total_seconds
                FROM videos GROUP BY course_id
            ) v ON v.course_id = c.id
            LEFT JOIN (
                SELECT course_id, COUNT(DISTINCT user_id) AS students
                FROM user_courses GROUP BY course_id
            ) e ON e.course_id = c.id
            WHERE c.is_published = TRUE
            "#,
        );

        if let Some(level) = CatalogFilter::active(&filter.level) {
            query.push(" AND c.difficulty_level = ").push_bind(level.to_string());
        }
        if let Some(category) = CatalogFilter::active(&filter.category) {
            query.push(" AND cat.name = ").push_bind(category.to_string());
        }
        query.push(sort.order_by());

        query.build_query_as::<CatalogRow>().fetch_all(pool).await
    }

    pub async fn find(pool: &PgPool, id: i32) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(&format!("SELECT {} FROM courses WHERE id = $1", COURSE_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_published(pool: &PgPool, id: i32) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE id = $1 AND is_published = TRUE",
            COURSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_with_stats(pool: &PgPool) -> Result<Vec<CourseSummary>, sqlx::Error> {
        sqlx::query_as::<_, CourseSummary>(
            r#"
            SELECT c.id, c.title, c.description, c.category_id, cat.name AS category,
                   c.price::float8 AS price, c.difficulty_level, c.is_published,
                   c.duration_minutes, c.created_at,
                   COUNT(DISTINCT v.id) AS total_videos,
                   COUNT(DISTINCT uc.user_id) AS enrolled_students
            FROM courses c
            LEFT JOIN categories cat ON c.category_id = cat.id
            LEFT JOIN videos v ON c.id = v.course_id
            LEFT JOIN user_courses uc ON c.id = uc.course_id
            GROUP BY c.id, cat.name
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_titles(pool: &PgPool) -> Result<Vec<CourseTitle>, sqlx::Error> {
        sqlx::query_as::<_, CourseTitle>("SELECT id, title FROM courses ORDER BY title")
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &PgPool, input: &CourseInput, instructor_id: UserId) -> Result<Course, sqlx::Error> {
        sqlx::query_as::<_, Course>(&format!(
            r#"
            INSERT INTO courses (title, description, category_id, instructor_id, price,
                                 difficulty_level, is_published, duration_minutes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            COURSE_COLUMNS
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.category_id)
        .bind(instructor_id)
        .bind(input.price)
        .bind(&input.difficulty_level)
        .bind(input.is_published)
        .bind(input.duration_minutes)
        .fetch_one(pool)
        .await
    }

    /// Returns None when the course does not exist
    pub async fn update(pool: &PgPool, id: i32, input: &CourseInput) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(&format!(
            r#"
            UPDATE courses
            SET title = $1, description = $2, category_id = $3, price = $4,
                difficulty_level = $5, is_published = $6, duration_minutes = $7,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $8
            RETURNING {}
            "#,
            COURSE_COLUMNS
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.category_id)
        .bind(input.price)
        .bind(&input.difficulty_level)
        .bind(input.is_published)
        .bind(input.duration_minutes)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Deletes the course with its videos and enrollments. Returns false if it did not exist.
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn enrolled_for_user(pool: &PgPool, user_id: UserId) -> Result<Vec<EnrolledCourse>, sqlx::Error> {
        sqlx::query_as::<_, EnrolledCourse>(
            r#"
            SELECT c.id, c.title, c.description, c.thumbnail_url, c.price::float8 AS price,
                   c.difficulty_level AS level, cat.name AS category, c.duration_minutes,
                   uc.enrolled_at, uc.progress_percentage, uc.completed_at,
                   COUNT(DISTINCT v.id) AS total_videos,
                   COUNT(DISTINCT CASE WHEN uvp.is_completed THEN uvp.video_id END) AS completed_videos
            FROM user_courses uc
            JOIN courses c ON uc.course_id = c.id
            LEFT JOIN categories cat ON c.category_id = cat.id
            LEFT JOIN videos v ON c.id = v.course_id
            LEFT JOIN user_video_progress uvp ON v.id = uvp.video_id AND uvp.user_id = uc.user_id
            WHERE uc.user_id = $1
            GROUP BY c.id, cat.name, uc.enrolled_at, uc.progress_percentage, uc.completed_at
            ORDER BY uc.enrolled_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parameter_parsing() {
        assert_eq!(CatalogSort::parse(None), CatalogSort::Popularity);
        assert_eq!(CatalogSort::parse(Some("price-low")), CatalogSort::PriceLow);
        assert_eq!(CatalogSort::parse(Some("price-high")), CatalogSort::PriceHigh);
        assert_eq!(CatalogSort::parse(Some("newest")), CatalogSort::Newest);
        assert_eq!(CatalogSort::parse(Some("bogus")), CatalogSort::Newest);
    }

    #[test]
    fn all_and_blank_filters_are_ignored() {
        assert_eq!(CatalogFilter::active(&Some("all".into())), None);
        assert_eq!(CatalogFilter::active(&Some("  ".into())), None);
        assert_eq!(CatalogFilter::active(&None), None);
        assert_eq!(CatalogFilter::active(&Some("beginner".into())), Some("beginner"));
    }
}
