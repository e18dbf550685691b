//! Database repositories, one per entity.

pub mod courses;
pub mod repository;
pub mod users;

pub use courses::Courses;
pub use repository::Repository;
pub use users::Users;
