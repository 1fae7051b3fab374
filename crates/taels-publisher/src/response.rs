//! Response values and the producers that build them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::component::Component;
use crate::error::PublishError;

/// Status used when a request is abandoned by its client.
pub const STATUS_CLIENT_CLOSED: u16 = 499;

/// A complete response ready to be written by the host server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Response {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Creates a `200` response with no headers.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// Creates a `text/plain` response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body).with_header("content-type", "text/plain; charset=utf-8")
    }

    /// Creates a `200` `text/html` response.
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(200, body).with_header("content-type", "text/html; charset=utf-8")
    }

    /// Serialises `value` into an `application/json` response.
    ///
    /// # Errors
    ///
    /// Returns an application error when `value` cannot be serialised.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Result<Self, PublishError> {
        let body = serde_json::to_string(value).map_err(PublishError::application)?;
        Ok(Self::new(status, body).with_header("content-type", "application/json"))
    }

    /// The response for a cancelled request.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::text(STATUS_CLIENT_CLOSED, "request cancelled")
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header value with a case-insensitive name match.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Response body.
    #[must_use]
    pub fn body(&self) -> &str {
        self.body.as_str()
    }
}

impl Component for Response {
    fn as_response(&self) -> Option<&Response> {
        Some(self)
    }
}

/// Zero-argument producer of a [`Response`].
#[async_trait]
pub trait ResponseFactory: Send + Sync {
    /// Produces the response.
    ///
    /// # Errors
    ///
    /// Any error raised while producing the response.
    async fn respond(&self) -> Result<Response, PublishError>;
}

/// Output of [`Renderable::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Markup to wrap in a `text/html` response.
    Body(String),
    /// A response to return as is.
    Response(Response),
}

/// A view that renders in two phases: `update`, then `render`.
#[async_trait]
pub trait Renderable: Send + Sync {
    /// Prepares state for rendering.
    ///
    /// # Errors
    ///
    /// Any error aborts rendering.
    async fn update(&self) -> Result<(), PublishError> {
        Ok(())
    }

    /// Produces the rendered output.
    ///
    /// # Errors
    ///
    /// Any error raised while rendering.
    async fn render(&self) -> Result<Rendered, PublishError>;
}

/// Adapts a [`Renderable`] into a [`ResponseFactory`].
#[derive(Debug)]
pub struct RenderableFactory<R> {
    renderable: Arc<R>,
}

impl<R> RenderableFactory<R> {
    /// Wraps a renderable.
    pub const fn new(renderable: Arc<R>) -> Self {
        Self { renderable }
    }
}

#[async_trait]
impl<R> ResponseFactory for RenderableFactory<R>
where
    R: Renderable + 'static,
{
    async fn respond(&self) -> Result<Response, PublishError> {
        self.renderable.update().await?;
        match self.renderable.render().await? {
            Rendered::Body(body) => Ok(Response::html(body)),
            Rendered::Response(response) => Ok(response),
        }
    }
}
