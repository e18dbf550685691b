//! Database request/response models, one module per entity.

pub mod courses;
pub mod users;
