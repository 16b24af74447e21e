use sqlx::PgPool;

use crate::auth::UserId;

pub struct Enrollment;

impl Enrollment {
    pub async fn exists(pool: &PgPool, user_id: UserId, course_id: i32) -> Result<bool, sqlx::Error> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM user_courses WHERE user_id = $1 AND course_id = $2")
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    /// Returns the new enrollment id, or None if the user was already enrolled
    pub async fn create(pool: &PgPool, user_id: UserId, course_id: i32) -> Result<Option<i32>, sqlx::Error> {
        let row: Option<(i32,)> = sqlx::query_as(
            r#"
            INSERT INTO user_courses (user_id, course_id, enrolled_at, progress_percentage)
            VALUES ($1, $2, CURRENT_TIMESTAMP, 0)
            ON CONFLICT (user_id, course_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}
