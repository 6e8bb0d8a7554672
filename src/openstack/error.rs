// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed errors for the OpenStack client.
//!
//! Every remote call classifies its failure into one of these variants so
//! that callers can distinguish not-found (finder misses), conflict
//! (already-exists semantics, usually swallowed) and transient conditions
//! (retried with backoff inside the client).

/// Error returned by OpenStack API operations.
#[derive(Debug, thiserror::Error)]
pub enum OpenStackError {
    /// The resource does not exist (HTTP 404). Finder operations map this to
    /// `None`; deletes swallow it.
    #[error("resource not found")]
    NotFound,

    /// The resource already exists or the operation conflicts (HTTP 409).
    /// Swallowed by callers with already-exists semantics.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The token was rejected (HTTP 401). The session is re-created and the
    /// call retried.
    #[error("authentication rejected")]
    Unauthorized,

    /// Rate limiting or server-side failure (HTTP 429/5xx); retried.
    #[error("transient API failure (status {status}): {message}")]
    Transient { status: u16, message: String },

    /// Any other HTTP failure; not retried.
    #[error("API request failed (status {status}): {message}")]
    Request { status: u16, message: String },

    /// Connection, timeout or body decoding failure; retried.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// clouds.yaml or catalog problems; fails fast.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The remote answered with a shape we cannot parse.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl OpenStackError {
    /// Whether the failure should be retried by the client's backoff loop.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OpenStackError::Transient { .. }
                | OpenStackError::Transport(_)
                | OpenStackError::Unauthorized
        )
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, OpenStackError::NotFound)
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, OpenStackError::Conflict(_))
    }
}

/// Classify an HTTP response, consuming error bodies for the message.
///
/// Returns the response untouched when the status is a success.
pub(crate) async fn check_response(
    resp: reqwest::Response,
) -> Result<reqwest::Response, OpenStackError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let code = status.as_u16();
    let message = resp.text().await.unwrap_or_default();

    match code {
        404 => Err(OpenStackError::NotFound),
        409 => Err(OpenStackError::Conflict(message)),
        401 => Err(OpenStackError::Unauthorized),
        429 | 500..=599 => Err(OpenStackError::Transient {
            status: code,
            message,
        }),
        _ => Err(OpenStackError::Request {
            status: code,
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::OpenStackError;

    #[test]
    fn test_transient_classification() {
        assert!(OpenStackError::Transient {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(OpenStackError::Unauthorized.is_transient());
        assert!(!OpenStackError::NotFound.is_transient());
        assert!(!OpenStackError::Conflict(String::new()).is_transient());
        assert!(!OpenStackError::Request {
            status: 400,
            message: String::new()
        }
        .is_transient());
    }

    #[test]
    fn test_not_found_and_conflict_predicates() {
        assert!(OpenStackError::NotFound.is_not_found());
        assert!(OpenStackError::Conflict("exists".into()).is_conflict());
        assert!(!OpenStackError::NotFound.is_conflict());
    }
}
