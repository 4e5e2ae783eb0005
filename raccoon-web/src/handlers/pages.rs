//! Static pages

use axum::response::Html;

const NOT_REACHABLE_HTML: &str = include_str!("../../static/RavenNotReachable.htm");

/// Served while the database cannot be reached
pub async fn not_reachable_page() -> Html<&'static str> {
    Html(NOT_REACHABLE_HTML)
}
