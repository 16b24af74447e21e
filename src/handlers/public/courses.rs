// handlers/public/courses.rs - GET /api/courses catalog handler

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::database::models::{CatalogFilter, CatalogRow, CatalogSort, Course};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub level: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

/// Catalog entry as shown on the course listing page
#[derive(Debug, Serialize)]
pub struct CatalogCourse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    #[serde(rename = "originalPrice")]
    pub original_price: f64,
    pub level: String,
    pub rating: f64,
    pub students: i64,
    pub duration: String,
    pub features: Vec<String>,
    pub category: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub total_videos: i64,
}

impl From<CatalogRow> for CatalogCourse {
    fn from(row: CatalogRow) -> Self {
        let hours = (row.total_seconds as f64 / 3600.0 * 10.0).round() / 10.0;
        let level_note = match row.level.as_str() {
            "beginner" => "Perfect for beginners",
            "intermediate" => "Intermediate level",
            _ => "Advanced concepts",
        };

        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            // Displayed as a 30% discount
            original_price: (row.price * 1.3).round(),
            rating: 0.0,
            students: row.students,
            duration: format!("{} hours", hours),
            features: vec![
                format!("{} video lessons", row.total_videos),
                format!("{} students enrolled", row.students),
                level_note.to_string(),
            ],
            level: row.level,
            category: row.category,
            created_at: row.created_at,
            total_videos: row.total_videos,
        }
    }
}

/// GET /api/courses?level=&category=&sortBy= - Published courses with stats
pub async fn catalog_get(State(state): State<AppState>, Query(query): Query<CatalogQuery>) -> ApiResult<Value> {
    let filter = CatalogFilter {
        level: query.level.clone(),
        category: query.category.clone(),
    };
    let sort = CatalogSort::parse(query.sort_by.as_deref());

    let courses: Vec<CatalogCourse> = Course::catalog(&state.pool, &filter, sort)
        .await?
        .into_iter()
        .map(CatalogCourse::from)
        .collect();

    Ok(ApiResponse::success(json!({
        "total": courses.len(),
        "courses": courses,
        "filters": {
            "level": query.level,
            "category": query.category,
            "sortBy": sort,
        }
    })))
}
