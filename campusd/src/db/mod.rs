//! Database layer.
//!
//! Uses the repository pattern to abstract data access: each entity (users,
//! courses) has a corresponding repository that handles queries and mutations
//! over a borrowed connection. The enrollment uniqueness invariant lives here
//! as a storage-level `UNIQUE` constraint rather than application logic.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub mod errors;
pub mod handlers;
pub mod models;

/// Open the SQLite pool for the given connection URL.
///
/// Foreign keys are enforced on every connection - identity deletion cascades
/// to owned courses and enrollment memberships.
pub async fn connect(url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}
