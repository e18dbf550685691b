//! Course management and enrollment.
//!
//! Ownership and the enrollment-uniqueness invariant are enforced here and in
//! the courses repository. The role gates in front of these handlers only
//! decide *which kind* of identity may call them; *which course* an
//! instructor may mutate is decided against the claims-derived id.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        courses::{CourseCreateRequest, CourseResponse, CourseUpdateRequest},
        users::AuthUser,
        MessageResponse,
    },
    db::{
        errors::DbError,
        handlers::{Courses, Repository as _},
        models::courses::{CourseCreateDBRequest, CourseUpdateDBRequest},
    },
    errors::Error,
    types::CourseId,
    AppState,
};

/// Create a course owned by the calling instructor
#[utoipa::path(
    post,
    path = "/course/createCourse",
    request_body = CourseCreateRequest,
    tag = "courses",
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an instructor"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all, fields(instructor = %user.id))]
pub async fn create_course(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CourseCreateRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), Error> {
    if request.title.trim().is_empty() {
        return Err(Error::Validation {
            message: "Title is required".to_string(),
        });
    }
    if request.description.trim().is_empty() {
        return Err(Error::Validation {
            message: "Description is required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut course_repo = Courses::new(&mut conn);

    let created = course_repo
        .create(&CourseCreateDBRequest {
            title: request.title,
            description: request.description,
            content: request.content,
            instructor: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List all courses
#[utoipa::path(
    get,
    path = "/course/getAllCourese",
    tag = "courses",
    responses(
        (status = 200, description = "All courses", body = Vec<CourseResponse>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn all_courses(State(state): State<AppState>) -> Result<Json<Vec<CourseResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut course_repo = Courses::new(&mut conn);

    let courses = course_repo.list_all().await?;
    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

/// List courses owned by the calling instructor
#[utoipa::path(
    get,
    path = "/course/getmycourses",
    tag = "courses",
    responses(
        (status = 200, description = "The instructor's courses", body = Vec<CourseResponse>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an instructor"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all, fields(instructor = %user.id))]
pub async fn my_courses(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<CourseResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut course_repo = Courses::new(&mut conn);

    let courses = course_repo.list_by_instructor(user.id).await?;
    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

/// Enroll the calling student in a course
#[utoipa::path(
    post,
    path = "/course/{id}/enroll",
    params(("id" = uuid::Uuid, Path, description = "Course id")),
    tag = "courses",
    responses(
        (status = 200, description = "Enrollment successful", body = MessageResponse),
        (status = 400, description = "Already enrolled"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not a student"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all, fields(course_id = %id, student = %user.id))]
pub async fn enroll(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<CourseId>,
) -> Result<Json<MessageResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut course_repo = Courses::new(&mut conn);

    // One atomic conditional insert: existence and membership are decided by
    // the store, so two concurrent enrolls cannot both succeed.
    match course_repo.enroll(id, user.id).await {
        Ok(true) => Ok(Json(MessageResponse::new("Enrollment successful"))),
        Ok(false) => Err(Error::NotFound {
            resource: "Course".to_string(),
        }),
        Err(DbError::UniqueViolation { .. }) => Err(Error::Conflict {
            message: "Already enrolled".to_string(),
        }),
        Err(other) => Err(Error::Database(other)),
    }
}

/// List courses the calling student is enrolled in
#[utoipa::path(
    get,
    path = "/course/enrolled",
    tag = "courses",
    responses(
        (status = 200, description = "Enrolled courses", body = Vec<CourseResponse>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not a student"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all, fields(student = %user.id))]
pub async fn enrolled_courses(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<CourseResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut course_repo = Courses::new(&mut conn);

    let courses = course_repo.list_enrolled(user.id).await?;
    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

/// Update a course. Only its owner may; only supplied fields change.
#[utoipa::path(
    put,
    path = "/course/{id}",
    params(("id" = uuid::Uuid, Path, description = "Course id")),
    request_body = CourseUpdateRequest,
    tag = "courses",
    responses(
        (status = 200, description = "Updated course", body = CourseResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller does not own the course"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all, fields(course_id = %id, requester = %user.id))]
pub async fn update_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<CourseId>,
    Json(request): Json<CourseUpdateRequest>,
) -> Result<Json<CourseResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut course_repo = Courses::new(&mut conn);

    // Existence is checked before ownership: a missing course is 404 even
    // for a caller who would not own it.
    let course = course_repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Course".to_string(),
    })?;
    if course.instructor != user.id {
        return Err(Error::Forbidden {
            message: "Not authorized".to_string(),
        });
    }

    let updated = course_repo
        .update(
            id,
            &CourseUpdateDBRequest {
                title: request.title,
                description: request.description,
                content: request.content,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

/// Delete a course. Only its owner may.
#[utoipa::path(
    delete,
    path = "/course/{id}",
    params(("id" = uuid::Uuid, Path, description = "Course id")),
    tag = "courses",
    responses(
        (status = 200, description = "Course deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller does not own the course"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all, fields(course_id = %id, requester = %user.id))]
pub async fn delete_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<CourseId>,
) -> Result<Json<MessageResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut course_repo = Courses::new(&mut conn);

    // Same existence-then-ownership ordering as update
    let course = course_repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Course".to_string(),
    })?;
    if course.instructor != user.id {
        return Err(Error::Forbidden {
            message: "Not authorized".to_string(),
        });
    }

    course_repo.delete(id).await?;

    Ok(Json(MessageResponse::new("Course deleted")))
}
