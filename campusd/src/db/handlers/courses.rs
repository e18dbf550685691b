//! Database repository for courses and enrollment memberships.

use crate::types::{abbrev_uuid, CourseId, UserId};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::courses::{CourseCreateDBRequest, CourseDBResponse, CourseUpdateDBRequest},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

// Database entity model, without the membership set
#[derive(Debug, Clone, FromRow)]
struct CourseRow {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub instructor: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseRow {
    fn into_response(self, students: Vec<UserId>) -> CourseDBResponse {
        CourseDBResponse {
            id: self.id,
            title: self.title,
            description: self.description,
            content: self.content,
            instructor: self.instructor,
            students,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub struct Courses<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Courses<'c> {
    type CreateRequest = CourseCreateDBRequest;
    type UpdateRequest = CourseUpdateDBRequest;
    type Response = CourseDBResponse;
    type Id = CourseId;

    #[instrument(skip(self, request), fields(title = %request.title, instructor = %abbrev_uuid(&request.instructor)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let course_id = Uuid::new_v4();
        let now = Utc::now();

        let course = sqlx::query_as::<_, CourseRow>(
            r#"
            INSERT INTO courses (id, title, description, content, instructor, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.content)
        .bind(request.instructor)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        // A new course starts with an empty student set
        Ok(course.into_response(Vec::new()))
    }

    #[instrument(skip(self), fields(course_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let course = sqlx::query_as::<_, CourseRow>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        match course {
            Some(course) => {
                let students = self.load_students(id).await?;
                Ok(Some(course.into_response(students)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, request), fields(course_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Atomic partial update: only supplied fields change
        let course = sqlx::query_as::<_, CourseRow>(
            r#"
            UPDATE courses SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                content = COALESCE($4, content),
                updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.content)
        .bind(Utc::now())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        let students = self.load_students(id).await?;
        Ok(course.into_response(students))
    }

    #[instrument(skip(self), fields(course_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Courses<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn list_all(&mut self) -> Result<Vec<CourseDBResponse>> {
        let courses = sqlx::query_as::<_, CourseRow>("SELECT * FROM courses ORDER BY created_at DESC")
            .fetch_all(&mut *self.db)
            .await?;

        self.with_students(courses).await
    }

    #[instrument(skip(self), fields(instructor = %abbrev_uuid(&instructor)), err)]
    pub async fn list_by_instructor(&mut self, instructor: UserId) -> Result<Vec<CourseDBResponse>> {
        let courses =
            sqlx::query_as::<_, CourseRow>("SELECT * FROM courses WHERE instructor = $1 ORDER BY created_at DESC")
                .bind(instructor)
                .fetch_all(&mut *self.db)
                .await?;

        self.with_students(courses).await
    }

    #[instrument(skip(self), fields(student = %abbrev_uuid(&student)), err)]
    pub async fn list_enrolled(&mut self, student: UserId) -> Result<Vec<CourseDBResponse>> {
        let courses = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT c.* FROM courses c
            INNER JOIN enrollments e ON e.course_id = c.id
            WHERE e.student_id = $1
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(student)
        .fetch_all(&mut *self.db)
        .await?;

        self.with_students(courses).await
    }

    /// Add a student to a course's membership set.
    ///
    /// The existence check and the member insert are one conditional INSERT,
    /// and the `UNIQUE (course_id, student_id)` constraint rejects duplicate
    /// membership, so two concurrent enrolls for the same pair cannot both
    /// succeed. Returns `false` when the course does not exist; a duplicate
    /// surfaces as [`DbError::UniqueViolation`].
    #[instrument(skip(self), fields(course_id = %abbrev_uuid(&course_id), student = %abbrev_uuid(&student)), err)]
    pub async fn enroll(&mut self, course_id: CourseId, student: UserId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO enrollments (course_id, student_id, enrolled_at)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM courses WHERE id = $1)
            "#,
        )
        .bind(course_id)
        .bind(student)
        .bind(Utc::now())
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn load_students(&mut self, course_id: CourseId) -> Result<Vec<UserId>> {
        let students = sqlx::query_scalar::<_, UserId>("SELECT student_id FROM enrollments WHERE course_id = $1")
            .bind(course_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(students)
    }

    async fn with_students(&mut self, courses: Vec<CourseRow>) -> Result<Vec<CourseDBResponse>> {
        let mut result = Vec::with_capacity(courses.len());
        for course in courses {
            let students = self.load_students(course.id).await?;
            result.push(course.into_response(students));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::super::repository::Repository;
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::handlers::Users;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::SqlitePool;

    async fn create_user(pool: &SqlitePool, username: &str, role: Role) -> UserId {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        repo.create(&UserCreateDBRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$fake-hash".to_string(),
            role,
        })
        .await
        .unwrap()
        .id
    }

    async fn create_course(pool: &SqlitePool, instructor: UserId, title: &str) -> CourseDBResponse {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Courses::new(&mut conn);
        repo.create(&CourseCreateDBRequest {
            title: title.to_string(),
            description: "A course".to_string(),
            content: Some("Lesson one".to_string()),
            instructor,
        })
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn test_create_and_get_course(pool: SqlitePool) {
        let instructor = create_user(&pool, "teach", Role::Instructor).await;
        let course = create_course(&pool, instructor, "Rust 101").await;

        assert_eq!(course.title, "Rust 101");
        assert_eq!(course.instructor, instructor);
        assert!(course.students.is_empty());

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Courses::new(&mut conn);
        let fetched = repo.get_by_id(course.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, course.id);
        assert_eq!(fetched.content.as_deref(), Some("Lesson one"));
    }

    #[sqlx::test]
    async fn test_enroll_adds_exactly_one_membership(pool: SqlitePool) {
        let instructor = create_user(&pool, "teach", Role::Instructor).await;
        let student = create_user(&pool, "student", Role::Student).await;
        let course = create_course(&pool, instructor, "Rust 101").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Courses::new(&mut conn);

        assert!(repo.enroll(course.id, student).await.unwrap());

        // Second enroll for the same pair hits the unique constraint
        let err = repo.enroll(course.id, student).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }), "expected unique violation, got {err:?}");

        // Membership count unchanged
        let fetched = repo.get_by_id(course.id).await.unwrap().unwrap();
        assert_eq!(fetched.students, vec![student]);
    }

    #[sqlx::test]
    async fn test_enroll_missing_course(pool: SqlitePool) {
        let student = create_user(&pool, "student", Role::Student).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Courses::new(&mut conn);

        let inserted = repo.enroll(Uuid::new_v4(), student).await.unwrap();
        assert!(!inserted);
    }

    #[sqlx::test]
    async fn test_list_enrolled_and_by_instructor(pool: SqlitePool) {
        let teach1 = create_user(&pool, "teach1", Role::Instructor).await;
        let teach2 = create_user(&pool, "teach2", Role::Instructor).await;
        let student = create_user(&pool, "student", Role::Student).await;

        let c1 = create_course(&pool, teach1, "Rust 101").await;
        let c2 = create_course(&pool, teach1, "Rust 201").await;
        let c3 = create_course(&pool, teach2, "Go 101").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Courses::new(&mut conn);

        repo.enroll(c1.id, student).await.unwrap();
        repo.enroll(c3.id, student).await.unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 3);

        let mine = repo.list_by_instructor(teach1).await.unwrap();
        let mut titles: Vec<_> = mine.iter().map(|c| c.title.as_str()).collect();
        titles.sort_unstable();
        assert_eq!(titles, vec!["Rust 101", "Rust 201"]);

        let enrolled = repo.list_enrolled(student).await.unwrap();
        let mut enrolled_ids: Vec<_> = enrolled.iter().map(|c| c.id).collect();
        enrolled_ids.sort_unstable();
        let mut expected = vec![c1.id, c3.id];
        expected.sort_unstable();
        assert_eq!(enrolled_ids, expected);
        assert!(!enrolled.iter().any(|c| c.id == c2.id));
    }

    #[sqlx::test]
    async fn test_partial_update_keeps_unspecified_fields(pool: SqlitePool) {
        let instructor = create_user(&pool, "teach", Role::Instructor).await;
        let course = create_course(&pool, instructor, "Old title").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Courses::new(&mut conn);

        let updated = repo
            .update(
                course.id,
                &CourseUpdateDBRequest {
                    title: Some("New title".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "New title");
        assert_eq!(updated.description, course.description);
        assert_eq!(updated.content, course.content);
    }

    #[sqlx::test]
    async fn test_update_missing_course_is_not_found(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Courses::new(&mut conn);

        let err = repo.update(Uuid::new_v4(), &CourseUpdateDBRequest::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    async fn test_deleting_identity_cascades(pool: SqlitePool) {
        let instructor = create_user(&pool, "teach", Role::Instructor).await;
        let student = create_user(&pool, "student", Role::Student).await;
        let course = create_course(&pool, instructor, "Rust 101").await;

        {
            let mut conn = pool.acquire().await.unwrap();
            let mut courses = Courses::new(&mut conn);
            courses.enroll(course.id, student).await.unwrap();
        }

        // Deleting the instructor removes the course and its enrollments
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        assert!(users.delete(instructor).await.unwrap());

        let mut courses = Courses::new(&mut conn);
        assert!(courses.get_by_id(course.id).await.unwrap().is_none());
        assert!(courses.list_enrolled(student).await.unwrap().is_empty());
    }
}
