//! Session cookie handling.
//!
//! Clients are identified by an opaque session id carried in a cookie. A
//! request without one gets a fresh UUID, returned via `Set-Cookie`.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use persona_core::session::SessionId;

/// Longest cookie value accepted as a session id.
const MAX_SESSION_ID_LEN: usize = 128;

/// Name and attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            secure,
        }
    }

    /// The session id from the request's `Cookie` headers, if present and sane.
    pub fn read(&self, headers: &HeaderMap) -> Option<SessionId> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim_matches('"'))
            .filter(|value| is_valid_session_id(value))
            .map(SessionId::from)
    }

    /// `Set-Cookie` value binding the client to `session`.
    ///
    /// No `Max-Age`: the cookie lasts for the browser session.
    pub fn set_cookie(&self, session: &SessionId) -> String {
        let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", self.name, session);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Non-empty, bounded, and limited to `[A-Za-z0-9_-]`.
fn is_valid_session_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_SESSION_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl Default for SessionCookie {
    fn default() -> Self {
        Self::new("session", false)
    }
}
