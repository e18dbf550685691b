//! API request/response models for courses.

use crate::db::models::courses::CourseDBResponse;
use crate::types::{CourseId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseCreateRequest {
    pub title: String,
    pub description: String,
    pub content: Option<String>,
}

/// Partial course update; only supplied fields change
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    /// Identity id of the owning instructor
    #[schema(value_type = String, format = "uuid")]
    pub instructor: UserId,
    /// Identity ids of enrolled students; a set, never containing duplicates
    #[schema(value_type = Vec<String>)]
    pub students: Vec<UserId>,
}

impl From<CourseDBResponse> for CourseResponse {
    fn from(db: CourseDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            content: db.content,
            instructor: db.instructor,
            students: db.students,
        }
    }
}
