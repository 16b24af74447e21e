// handlers/public/pages.rs - HTML shells for browser routes
//
// The frontend is served separately; these give the session middleware real
// page routes to protect and redirect from.

use axum::{extract::Path, response::Html, Extension};

use crate::auth::Identity;

fn shell(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><main id=\"app\" data-page=\"{title}\">{body}</main></body></html>"
    ))
}

pub async fn courses_page() -> Html<String> {
    shell("Courses", "")
}

pub async fn pricing_page() -> Html<String> {
    shell("Pricing", "")
}

pub async fn dashboard_page(Extension(identity): Extension<Identity>) -> Html<String> {
    shell("Dashboard", &format!("<p data-user-id=\"{}\"></p>", identity.user_id))
}

pub async fn course_player_page(Path(course_id): Path<i32>) -> Html<String> {
    shell("Course", &format!("<p data-course-id=\"{}\"></p>", course_id))
}

pub async fn admin_page() -> Html<String> {
    shell("Admin", "")
}
