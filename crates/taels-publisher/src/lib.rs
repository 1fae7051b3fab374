//! Object-graph publishing for the taels dispatcher.
//!
//! A request path is decomposed into namespace-tagged segments, consumed one
//! segment at a time against a host-supplied object graph, and the node it
//! ends on is turned into a response: directly when the node already is one,
//! through its own response factory, or through a view registered for its
//! type.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use taels_publisher::{Component, Publisher, Request, Response, View};
//! use taels_publisher::{PublishError, ResponseFactory};
//!
//! #[derive(Debug)]
//! struct Site;
//! impl Component for Site {}
//!
//! #[derive(Debug)]
//! struct Index;
//!
//! #[async_trait::async_trait]
//! impl ResponseFactory for Index {
//!     async fn respond(&self) -> Result<Response, PublishError> {
//!         Ok(Response::ok("welcome"))
//!     }
//! }
//!
//! impl View for Index {
//!     fn response_factory(self: Arc<Self>) -> Option<Arc<dyn ResponseFactory>> {
//!         Some(self)
//!     }
//! }
//!
//! let mut builder = Publisher::builder(Arc::new(Site));
//! builder
//!     .register_view::<Site, _>("index", |_, _| Ok(Arc::new(Index)))
//!     .expect("register view");
//! let publisher = builder.build();
//! let request = Request::get("/");
//! # let _ = (publisher, request);
//! ```

pub mod adapter;
pub mod component;
pub mod consumer;
pub mod error;
pub mod model;
pub mod path;
pub mod publisher;
pub mod registry;
pub mod request;
pub mod response;
pub mod view;

#[cfg(test)]
mod tests;

/// Tracing target for traversal steps.
pub(crate) const TRAVERSAL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::traversal");
/// Tracing target for view resolution and rendering.
pub(crate) const VIEW_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::view");
/// Tracing target for the publisher entry point.
pub(crate) const PUBLISH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::publish");

/// Shortcut prefix mapped onto [`Namespace::View`] by default.
pub const DEFAULT_VIEW_PREFIX: &str = "@@";

pub use self::adapter::{ResolvedTarget, ResponseAdapter, ResponseFactories};
pub use self::component::{
    AttributeTraversable, Component, ItemError, ItemIndexable, Node, downcast_node,
};
pub use self::consumer::{
    ATTRIBUTE_CONSUMER_ORDER, AttributeConsumer, Consumer, ConsumerChain, Consumption,
    ITEM_CONSUMER_ORDER, ItemConsumer, TRAVERSER_CONSUMER_ORDER, Traverser, TraverserConsumer,
    TraverserRegistry,
};
pub use self::error::{ApplicationError, PublishError, RegistryError, ResolveError};
pub use self::model::{ModelResolver, Resolution};
pub use self::path::{Namespace, Segment, Shortcuts, Stack};
pub use self::publisher::{ErrorView, ErrorViews, Publisher, PublisherBuilder};
pub use self::registry::{OrderedRegistry, Predicate, Registration};
pub use self::request::{Principal, Request};
pub use self::response::{
    Renderable, RenderableFactory, Rendered, Response, ResponseFactory, STATUS_CLIENT_CLOSED,
};
pub use self::view::{DEFAULT_VIEW_NAME, View, ViewLookup, ViewRegistry, ViewResolver};
