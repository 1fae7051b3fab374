//! Request dispatch around the publisher.
//!
//! A [`PipelineDispatcher`] runs four stages for every request: ordered
//! request hooks, publication, error recovery and ordered response hooks.
//! Dispatch never fails; every outcome is a [`taels_publisher::Response`].

mod error_handler;
mod hooks;
mod pipeline;

#[cfg(test)]
mod tests;

/// Tracing target for dispatch events.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

pub use self::error_handler::{DefaultErrorHandler, ErrorHandler};
pub use self::hooks::{Hook, HookRegistry, RequestHook, ResponseHook, Stage};
pub use self::pipeline::{DispatcherBuilder, PipelineDispatcher, SECONDARY_ERROR_BODY};
