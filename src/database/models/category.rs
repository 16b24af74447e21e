use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT id, name, description FROM categories ORDER BY name")
            .fetch_all(pool)
            .await
    }

    pub async fn find(pool: &PgPool, id: i32) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
