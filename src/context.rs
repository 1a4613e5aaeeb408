//! Session-scoped collaborators shared by the dashboards and the alert feed.
//!
//! The browser original reached for ambient singletons (`localStorage`, a
//! root-provided theme service). Here everything a component needs arrives
//! explicitly through [`AppContext`], built once per UI session and torn
//! down by dropping the handles that borrow from it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::client::HttpSensorClient;
use crate::config::Config;

// ---

/// Key under which the auth collaborator stores the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Small string key-value surface backing credentials.
///
/// The auth collaborator writes and clears the `token` entry (on login and
/// logout); this crate only ever reads it when building request headers.
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().expect("session store poisoned").get(key).cloned()
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .write()
            .expect("session store poisoned")
            .insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().expect("session store poisoned").remove(key)
    }

    /// The bearer token, if one is present and non-blank.
    ///
    /// Blank/whitespace tokens count as absent so an `Authorization` header
    /// is never sent empty.
    pub fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY).filter(|t| !t.trim().is_empty())
    }
}

// ---

/// Process-wide display theme. Persisted by the shell, read-only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    // ---
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parse a stored preference; anything unrecognized falls back to dark,
    /// matching the shell's default.
    pub fn from_preference(raw: &str) -> Theme {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Theme::Light,
            _ => Theme::Dark,
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

// ---

/// Everything a dashboard or alert component needs, bundled for injection.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub session: SessionStore,
    pub client: HttpSensorClient,
}

impl AppContext {
    /// Wire up a fresh session: empty credential store, one shared HTTP
    /// client bound to the configured backend.
    pub fn new(config: Config) -> Self {
        // ---
        let session = SessionStore::new();
        let client = HttpSensorClient::new(&config, session.clone());
        Self {
            config,
            session,
            client,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_blank_token_counts_as_absent() {
        // ---
        let session = SessionStore::new();
        assert_eq!(session.token(), None);

        session.put(TOKEN_KEY, "   ");
        assert_eq!(session.token(), None);

        session.put(TOKEN_KEY, "abc123");
        assert_eq!(session.token(), Some("abc123".to_string()));

        session.remove(TOKEN_KEY);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn test_theme_preference_parsing() {
        // ---
        assert_eq!(Theme::from_preference("light"), Theme::Light);
        assert_eq!(Theme::from_preference(" LIGHT "), Theme::Light);
        assert_eq!(Theme::from_preference("dark"), Theme::Dark);
        assert_eq!(Theme::from_preference("solarized"), Theme::Dark);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }
}
