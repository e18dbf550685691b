//! Database models for courses.

use crate::types::{CourseId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a new course
#[derive(Debug, Clone)]
pub struct CourseCreateDBRequest {
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub instructor: UserId,
}

/// Database request for a partial course update
#[derive(Debug, Clone, Default)]
pub struct CourseUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

/// Database response for a course, including its enrollment membership
#[derive(Debug, Clone)]
pub struct CourseDBResponse {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub instructor: UserId,
    pub students: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
