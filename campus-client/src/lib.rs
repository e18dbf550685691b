//! # campus-client: Device-Side Session SDK
//!
//! `campus-client` is the client half of the course marketplace: a typed HTTP
//! client over the server's API, durable on-device persistence of the current
//! session, and the state machine that keeps a device's cached identity
//! consistent with server-issued credentials.
//!
//! ## Overview
//!
//! A device holds at most one logical session: an opaque session token plus a
//! cached identity projection, persisted together by a [`SessionStore`]. The
//! [`SessionController`] arbitrates the session lifecycle as an explicit
//! state machine (`Loading` → `Authenticated` | `Unauthenticated`):
//!
//! - **Hydrate** restores the session from storage at launch, trusting the
//!   cache only after decoding the token's expiry claim against the local
//!   clock - no network call involved.
//! - **Login**/**register** call the server, persist `{token, identity}` and
//!   transition to `Authenticated`; failures surface to the caller and leave
//!   the device signed out.
//! - **Logout** unconditionally clears the persisted session.
//! - **Profile updates** compute a delta against the cached identity, no-op
//!   when empty, and merge the server's response into memory and storage.
//!
//! State changes are broadcast to subscribers through a
//! [`tokio::sync::watch`] channel; presentation code observes the channel
//! rather than sharing mutable session state.
//!
//! The controller runs under a single-threaded cooperative model: operations
//! take `&mut self` and await their storage writes sequentially, so no
//! locking is needed.

pub mod api;
pub mod controller;
pub mod error;
pub mod models;
pub mod store;
pub mod token;

pub use api::ApiClient;
pub use controller::{SessionController, SessionState};
pub use error::ClientError;
pub use models::{AuthResponse, Course, Identity, ProfileUpdate, Role};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession};
