//! Common types used across multiple handlers

use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

/// Body returned when a document was created
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// Body returned when work was queued for later
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub status: String,
    pub message: String,
}
