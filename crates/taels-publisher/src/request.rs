//! The request value threaded through hooks and resolution.

use tokio_util::sync::CancellationToken;

use crate::error::PublishError;

/// Identity attached to a request by an authentication hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: String,
}

impl Principal {
    /// Creates a principal with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The principal's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }
}

/// An inbound request as seen by the dispatcher.
///
/// The path is stored as received. Percent-decoding happens when the
/// publisher parses it.
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    principal: Option<Principal>,
    cancellation: CancellationToken,
}

impl Request {
    /// Creates a request with a fresh cancellation token.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: Vec::new(),
            principal: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Creates a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replaces the cancellation token, typically with a child of the
    /// connection's token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Raw request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// First header value with a case-insensitive name match.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The authenticated principal, if a hook has set one.
    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Records the authenticated principal.
    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    /// The token observed at every suspension point.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` once the request has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fails with [`PublishError::Cancelled`] once the request is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Cancelled`] when the token has fired.
    pub fn ensure_active(&self) -> Result<(), PublishError> {
        if self.is_cancelled() {
            return Err(PublishError::Cancelled);
        }
        Ok(())
    }
}
