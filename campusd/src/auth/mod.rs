//! Authentication and authorization.
//!
//! - [`password`]: irreversible secret hashing and verification using Argon2
//! - [`session`]: signed session token minting and verification
//! - [`middleware`]: the access gate - an ordered verify-then-role pipeline
//!   applied to every protected route
//!
//! The server keeps no session state: a request's identity and role are
//! derived solely from the verified token claims.

pub mod middleware;
pub mod password;
pub mod session;
