//! Explicit session context.
//!
//! The logged-in user is held here and nowhere else; there is no ambient
//! global to consult. The facade owns a `Session` and starts/ends it
//! through login/logout.

use shared::SessionUser;

/// Holds the current login, if any. The bearer token for every request
/// comes from here.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<SessionUser>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a session from an already-obtained login (e.g. restored by
    /// the embedding application).
    pub fn resumed(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn start(&mut self, user: SessionUser) {
        self.user = Some(user);
    }

    /// Teardown. Requests issued afterwards carry no bearer token.
    pub fn end(&mut self) {
        self.user = None;
    }

    pub fn is_active(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.token.as_str())
    }
}
