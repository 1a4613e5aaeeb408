//! Error taxonomy for backend fetches.

use thiserror::Error;

// ---

/// Failure classes for a single backend request.
///
/// Every failure degrades to "show nothing new": the controller clears its
/// data and waits for the next user action or refresh tick. Nothing here is
/// retried automatically and nothing is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// HTTP 401. The session token was rejected; the embedding view is
    /// expected to redirect to login.
    #[error("unauthorized: the backend rejected the session token")]
    Unauthorized,

    /// HTTP 403. The account is valid but may not read this resource.
    #[error("forbidden: this account may not access the resource")]
    Forbidden,

    /// The request never produced an HTTP status (connection refused, DNS,
    /// TLS, timeout). Matches the browser's "status 0" class.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// Any other non-success status.
    #[error("unexpected response status {0}")]
    Status(u16),

    /// A 2xx response whose body did not parse as the expected shape.
    #[error("malformed response body: {0}")]
    Decode(String),
}

/// The four coarse classes views and logs care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Unauthorized,
    Forbidden,
    Unreachable,
    Other,
}

impl FetchError {
    // ---
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Unauthorized => FetchErrorKind::Unauthorized,
            FetchError::Forbidden => FetchErrorKind::Forbidden,
            FetchError::Unreachable(_) => FetchErrorKind::Unreachable,
            FetchError::Status(_) | FetchError::Decode(_) => FetchErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_kind_classification() {
        // ---
        assert_eq!(FetchError::Unauthorized.kind(), FetchErrorKind::Unauthorized);
        assert_eq!(FetchError::Forbidden.kind(), FetchErrorKind::Forbidden);
        assert_eq!(
            FetchError::Unreachable("connection refused".into()).kind(),
            FetchErrorKind::Unreachable
        );
        assert_eq!(FetchError::Status(500).kind(), FetchErrorKind::Other);
        assert_eq!(FetchError::Decode("eof".into()).kind(), FetchErrorKind::Other);
    }
}
