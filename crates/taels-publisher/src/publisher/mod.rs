//! The publisher: path to response for a single request.
//!
//! Publishing percent-decodes the request path, parses it into a
//! [`Stack`], walks the object graph with the [`ModelResolver`], picks a
//! view with the [`ViewResolver`] and hands the result to the
//! [`ResponseAdapter`]. A failure is offered to the registered error views
//! before it is returned to the caller.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use crate::PUBLISH_TARGET;
use crate::adapter::{ResolvedTarget, ResponseAdapter};
use crate::component::Node;
use crate::error::PublishError;
use crate::model::{ModelResolver, Resolution};
use crate::path::{Shortcuts, Stack};
use crate::request::Request;
use crate::response::Response;
use crate::view::ViewResolver;

mod builder;
mod error_view;

pub use self::builder::PublisherBuilder;
pub use self::error_view::{ErrorView, ErrorViews};

/// Resolves requests against a fixed root and frozen registries.
///
/// Build one with [`PublisherBuilder`]. A publisher is immutable and can be
/// shared across concurrent requests.
#[derive(Debug, Clone)]
pub struct Publisher {
    root: Node,
    shortcuts: Shortcuts,
    models: ModelResolver,
    views: ViewResolver,
    adapter: ResponseAdapter,
    error_views: ErrorViews,
}

impl Publisher {
    /// Starts building a publisher rooted at `root`.
    #[must_use]
    pub fn builder(root: Node) -> PublisherBuilder {
        PublisherBuilder::new(root)
    }

    /// The root node every request starts from.
    #[must_use]
    pub const fn root(&self) -> &Node {
        &self.root
    }

    /// The shortcut table used to parse paths.
    #[must_use]
    pub const fn shortcuts(&self) -> &Shortcuts {
        &self.shortcuts
    }

    /// Parses the request path into a segment stack.
    #[must_use]
    pub fn stack_for(&self, request: &Request) -> Stack {
        let decoded: Cow<'_, str> = percent_decode_str(request.path()).decode_utf8_lossy();
        Stack::parse(&decoded, &self.shortcuts)
    }

    /// Publishes `request`, rendering failures through the error views.
    ///
    /// # Errors
    ///
    /// Returns the failure when no error view handles it, whatever the
    /// error view raised, or [`PublishError::Cancelled`].
    pub async fn publish(&self, request: &Request) -> Result<Response, PublishError> {
        match self.resolve(request).await {
            Ok(response) => Ok(response),
            Err(PublishError::Cancelled) => Err(PublishError::Cancelled),
            Err(error) => self.render_error(request, error).await,
        }
    }

    /// Publishes `request` without consulting the error views.
    ///
    /// # Errors
    ///
    /// Any resolution, application or cancellation failure.
    pub async fn resolve(&self, request: &Request) -> Result<Response, PublishError> {
        let stack = self.stack_for(request);
        debug!(
            target: PUBLISH_TARGET,
            path = request.path(),
            segments = stack.len(),
            "publishing"
        );
        let Resolution { model, leftover } = self
            .models
            .resolve(request, self.root.clone(), stack)
            .await?;
        let target = match ResolvedTarget::from_model(&model) {
            Some(target) => target,
            None => ResolvedTarget::View(self.views.resolve(request, &model, &leftover).await?),
        };
        self.adapter.materialize(request, target).await
    }

    async fn render_error(
        &self,
        request: &Request,
        error: PublishError,
    ) -> Result<Response, PublishError> {
        let Some((handled, view)) = self.error_views.lookup(&error) else {
            debug!(
                target: PUBLISH_TARGET,
                error = %error,
                "no error view registered"
            );
            return Err(error);
        };
        warn!(
            target: PUBLISH_TARGET,
            error = %error,
            error_type = handled,
            "rendering error view"
        );
        view.render(request, &error).await
    }
}
