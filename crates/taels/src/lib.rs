//! Request dispatch for object-graph publishing.
//!
//! The crate wraps a [`taels_publisher::Publisher`] in a
//! [`PipelineDispatcher`] that runs every request through four stages:
//!
//! 1. ordered request hooks, any of which may short-circuit with a response;
//! 2. publication, which walks the object graph and renders a view;
//! 3. error recovery through an [`ErrorHandler`], with a guarded fallback
//!    when the handler itself fails;
//! 4. ordered response hooks, whose failures never replace the response.
//!
//! [`bootstrap_with`] loads [`Config`], installs structured telemetry and
//! seeds the publisher and dispatcher builders from it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use taels::{Component, PipelineDispatcher, Publisher, Request};
//!
//! #[derive(Debug)]
//! struct Site;
//! impl Component for Site {}
//!
//! let dispatcher = PipelineDispatcher::builder(Publisher::builder(Arc::new(Site)).build()).build();
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .build()
//!     .expect("runtime");
//! let response = runtime.block_on(dispatcher.dispatch(Request::get("/")));
//! assert_eq!(response.status(), 404);
//! ```

mod bootstrap;
pub mod dispatch;
mod health;
mod telemetry;

pub use bootstrap::{
    Bootstrap, BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use dispatch::{
    DefaultErrorHandler, DispatcherBuilder, ErrorHandler, Hook, HookRegistry, PipelineDispatcher,
    RequestHook, ResponseHook, SECONDARY_ERROR_BODY, Stage,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use taels_config::{Config, LogFormat};
pub use taels_publisher::{
    ApplicationError, AttributeTraversable, Component, ErrorView, ItemError, ItemIndexable,
    Namespace, Node, Principal, PublishError, Publisher, PublisherBuilder, RegistryError,
    Renderable, Rendered, Request, ResolveError, Response, ResponseFactory, View,
};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};

#[cfg(test)]
mod tests;
