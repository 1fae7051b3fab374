//! Error-stage handlers.

use std::error::Error as StdError;
use std::fmt::Write as _;

use async_trait::async_trait;

use taels_publisher::{PublishError, Request, Response};

/// Turns a failure into a response.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    /// Produces the response for `error`.
    ///
    /// # Errors
    ///
    /// A failure here is a secondary error; the dispatcher falls back to
    /// [`ErrorHandler::default`] or a fixed 500 response.
    async fn response(&self, request: &Request, error: &PublishError)
    -> Result<Response, PublishError>;

    /// Infallible fallback used when [`ErrorHandler::response`] raised a
    /// publication error of its own.
    fn default(&self, request: &Request, error: &PublishError) -> Response;
}

/// Plain-text error pages keyed on the error's status.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorHandler {
    debug: bool,
}

impl DefaultErrorHandler {
    /// Creates a handler; `debug` includes the error and its source chain in
    /// the body.
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }

    fn body(&self, error: &PublishError) -> String {
        if self.debug {
            return describe_chain(error);
        }
        match error.status() {
            404 => "Not Found",
            499 => "Request cancelled",
            _ => "Internal Server Error",
        }
        .to_owned()
    }
}

#[async_trait]
impl ErrorHandler for DefaultErrorHandler {
    async fn response(
        &self,
        request: &Request,
        error: &PublishError,
    ) -> Result<Response, PublishError> {
        Ok(self.default(request, error))
    }

    fn default(&self, _request: &Request, error: &PublishError) -> Response {
        Response::text(error.status(), self.body(error))
    }
}

/// Renders `error` followed by one `caused by:` line per source.
pub(crate) fn describe_chain(error: &dyn StdError) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        // Writing to a String cannot fail.
        let _ = write!(text, "\ncaused by: {cause}");
        source = cause.source();
    }
    text
}
