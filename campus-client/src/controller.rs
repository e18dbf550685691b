//! The session state machine.
//!
//! One controller exists per device. It hydrates from the [`SessionStore`]
//! at launch, arbitrates `Loading` / `Authenticated` / `Unauthenticated`
//! state, and drives login, registration, logout and profile updates.
//! Observers subscribe to state transitions through a watch channel instead
//! of sharing mutable session state.

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::{Identity, ProfileUpdate, Role};
use crate::store::{SessionStore, StoredSession};
use crate::token;

/// Current session state.
///
/// `Loading` only exists between construction and the first [`hydrate`];
/// every operation afterwards resolves to one of the other two states.
///
/// [`hydrate`]: SessionController::hydrate
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Authenticated(Identity),
    Unauthenticated,
}

/// Drives the client-side session lifecycle over an [`ApiClient`] and a
/// [`SessionStore`].
///
/// Operations take `&mut self` and await their storage writes sequentially
/// (single-threaded cooperative model); no locking is required.
pub struct SessionController<S> {
    api: ApiClient,
    store: S,
    session: Option<StoredSession>,
    state: watch::Sender<SessionState>,
}

impl<S: SessionStore> SessionController<S> {
    /// Create a controller in the `Loading` state. Call
    /// [`hydrate`](Self::hydrate) to resolve it.
    pub fn new(api: ApiClient, store: S) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            api,
            store,
            session: None,
            state,
        }
    }

    /// Subscribe to session state transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The current session state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The current session token, when authenticated
    pub fn session_token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }

    /// Restore session state from durable storage.
    ///
    /// The cached identity is trusted only when the stored document is
    /// complete AND the token's expiry claim has not passed on the local
    /// clock - the expiry check always runs here, before any routing
    /// decision is made from the cached state. Anything else clears the
    /// store and resolves to `Unauthenticated`.
    pub async fn hydrate(&mut self) -> Result<()> {
        let loaded = match self.store.load().await {
            Ok(loaded) => loaded,
            Err(error) => {
                warn!("Discarding unreadable stored session: {error}");
                self.store.clear().await?;
                self.transition(None);
                return Ok(());
            }
        };

        match loaded {
            Some(session) => {
                let expired = token::is_expired(&session.token).unwrap_or(true);
                if expired {
                    debug!("Stored session token expired; clearing");
                    self.store.clear().await?;
                    self.transition(None);
                } else {
                    self.transition(Some(session));
                }
            }
            None => self.transition(None),
        }

        Ok(())
    }

    /// Log in and persist the issued session.
    ///
    /// On failure the device is left signed out and the error is returned to
    /// the caller, never swallowed.
    pub async fn login(&mut self, username: &str, secret: &str) -> Result<Identity> {
        match self.api.login(username, secret).await {
            Ok(auth) => {
                let session = StoredSession {
                    token: auth.token,
                    user: auth.user.clone(),
                };
                self.store.save(&session).await?;
                self.transition(Some(session));
                Ok(auth.user)
            }
            Err(error) => {
                self.transition(None);
                Err(error)
            }
        }
    }

    /// Register a new identity and persist the issued session.
    pub async fn register(&mut self, username: &str, email: &str, secret: &str, role: Role) -> Result<Identity> {
        match self.api.register(username, email, secret, role).await {
            Ok(auth) => {
                let session = StoredSession {
                    token: auth.token,
                    user: auth.user.clone(),
                };
                self.store.save(&session).await?;
                self.transition(Some(session));
                Ok(auth.user)
            }
            Err(error) => {
                self.transition(None);
                Err(error)
            }
        }
    }

    /// Log out: clear the persisted session and sign out, regardless of
    /// prior state. There is no server-side session to revoke.
    pub async fn logout(&mut self) -> Result<()> {
        let cleared = self.store.clear().await;
        self.transition(None);
        cleared
    }

    /// Update the profile of the authenticated identity.
    ///
    /// Fields equal to the cached identity are dropped from the request; if
    /// nothing remains the call is a no-op. On success the server's response
    /// replaces the cached identity in memory and storage.
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<Identity> {
        let Some(current) = self.session.clone() else {
            return Err(ClientError::NotAuthenticated);
        };

        // Compute the delta; a new secret always passes through since it
        // cannot be compared against the stored hash.
        let delta = ProfileUpdate {
            username: update.username.filter(|username| username != &current.user.username),
            email: update.email.filter(|email| email != &current.user.email),
            secret: update.secret,
        };

        if delta.is_empty() {
            debug!("No changes detected for profile update");
            return Ok(current.user);
        }

        let updated = self.api.update_user(&current.token, &delta).await?;

        let session = StoredSession {
            token: current.token,
            user: updated.clone(),
        };
        self.store.save(&session).await?;
        self.transition(Some(session));

        Ok(updated)
    }

    fn transition(&mut self, session: Option<StoredSession>) {
        let next = match &session {
            Some(session) => SessionState::Authenticated(session.user.clone()),
            None => SessionState::Unauthenticated,
        };
        self.session = session;
        self.state.send_replace(next);
    }
}
