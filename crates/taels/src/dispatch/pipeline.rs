//! The request, resolution, error and response stages.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use taels_config::Config;
use taels_publisher::{PublishError, Publisher, RegistryError, Request, Response};

use super::DISPATCH_TARGET;
use super::error_handler::{DefaultErrorHandler, ErrorHandler, describe_chain};
use super::hooks::{Hook, HookRegistry, RequestHook, ResponseHook};

/// Body returned when error handling fails outside debug mode.
pub const SECONDARY_ERROR_BODY: &str = "An error occurred while handling an error";

/// Runs a request through hooks, the publisher and error recovery.
#[derive(Clone)]
pub struct PipelineDispatcher {
    publisher: Publisher,
    hooks: HookRegistry,
    error_handler: Arc<dyn ErrorHandler>,
    debug: bool,
}

impl PipelineDispatcher {
    /// Starts a builder around `publisher`.
    #[must_use]
    pub fn builder(publisher: Publisher) -> DispatcherBuilder {
        DispatcherBuilder::new(publisher)
    }

    /// The wrapped publisher.
    #[must_use]
    pub const fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// The registered hooks.
    #[must_use]
    pub const fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Whether verbose secondary-error bodies are enabled.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Dispatches `request` and always yields a response.
    pub async fn dispatch(&self, mut request: Request) -> Response {
        let outcome = match self.handle(&mut request).await {
            Ok(response) => response,
            Err(failure) => self.recover(&request, &failure).await,
        };
        let response = self.review(&request, outcome).await;
        info!(
            target: DISPATCH_TARGET,
            method = request.method(),
            path = request.path(),
            status = response.status(),
            "request dispatched"
        );
        response
    }

    async fn handle(&self, request: &mut Request) -> Result<Response, PublishError> {
        for hook in self.hooks.request_hooks() {
            request.ensure_active()?;
            if let Some(response) = hook.on_request(request).await? {
                debug!(
                    target: DISPATCH_TARGET,
                    path = request.path(),
                    status = response.status(),
                    "request hook short-circuited"
                );
                return Ok(response);
            }
        }
        request.ensure_active()?;
        self.publisher.publish(request).await
    }

    async fn recover(&self, request: &Request, failure: &PublishError) -> Response {
        if failure.is_cancelled() {
            debug!(target: DISPATCH_TARGET, path = request.path(), "request cancelled");
            return Response::cancelled();
        }
        warn!(
            target: DISPATCH_TARGET,
            path = request.path(),
            status = failure.status(),
            error = %failure,
            "request failed"
        );
        match self.error_handler.response(request, failure).await {
            Ok(response) => response,
            Err(secondary) => self.fallback(request, failure, &secondary),
        }
    }

    fn fallback(&self, request: &Request, primary: &PublishError, secondary: &PublishError) -> Response {
        error!(
            target: DISPATCH_TARGET,
            path = request.path(),
            primary = %primary,
            secondary = %secondary,
            "error handling failed"
        );
        if secondary.is_publication_error() {
            return self.error_handler.default(request, secondary);
        }
        if self.debug {
            return Response::text(
                500,
                format!(
                    "Error while handling error: {secondary}\nStack: {}",
                    describe_chain(primary)
                ),
            );
        }
        Response::text(500, SECONDARY_ERROR_BODY)
    }

    async fn review(&self, request: &Request, response: Response) -> Response {
        let mut current = response.clone();
        for hook in self.hooks.response_hooks() {
            match hook.on_response(request, &current).await {
                Ok(Some(replacement)) => current = replacement,
                Ok(None) => {}
                Err(failure) => {
                    error!(
                        target: DISPATCH_TARGET,
                        path = request.path(),
                        error = %failure,
                        "response hook failed; keeping the original response"
                    );
                    return response;
                }
            }
        }
        current
    }
}

impl fmt::Debug for PipelineDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineDispatcher")
            .field("publisher", &self.publisher)
            .field("hooks", &self.hooks)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`PipelineDispatcher`].
pub struct DispatcherBuilder {
    publisher: Publisher,
    hooks: HookRegistry,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    debug: bool,
}

impl DispatcherBuilder {
    /// Starts with no hooks, the default error handler and debug off.
    #[must_use]
    pub fn new(publisher: Publisher) -> Self {
        Self {
            publisher,
            hooks: HookRegistry::new(),
            error_handler: None,
            debug: false,
        }
    }

    /// Starts with debug mode taken from `config`.
    #[must_use]
    pub fn from_config(publisher: Publisher, config: &Config) -> Self {
        let mut builder = Self::new(publisher);
        builder.with_debug(config.debug());
        builder
    }

    /// Toggles verbose secondary-error bodies.
    pub const fn with_debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    /// Replaces the default error handler.
    pub fn with_error_handler(&mut self, handler: Arc<dyn ErrorHandler>) -> &mut Self {
        self.error_handler = Some(handler);
        self
    }

    /// Adds a request hook.
    pub fn add_request_hook(&mut self, order: i32, hook: Arc<dyn RequestHook>) -> &mut Self {
        self.hooks.add_request_hook(order, hook);
        self
    }

    /// Adds a response hook.
    pub fn add_response_hook(&mut self, order: i32, hook: Arc<dyn ResponseHook>) -> &mut Self {
        self.hooks.add_response_hook(order, hook);
        self
    }

    /// Adds a hook under a textual stage key (`request` or `response`).
    ///
    /// # Errors
    ///
    /// See [`HookRegistry::register`].
    pub fn register_hook(
        &mut self,
        key: &str,
        order: i32,
        hook: Hook,
    ) -> Result<&mut Self, RegistryError> {
        self.hooks.register(key, order, hook)?;
        Ok(self)
    }

    /// Finishes the dispatcher.
    #[must_use]
    pub fn build(self) -> PipelineDispatcher {
        let debug = self.debug;
        PipelineDispatcher {
            publisher: self.publisher,
            hooks: self.hooks,
            error_handler: self
                .error_handler
                .unwrap_or_else(|| Arc::new(DefaultErrorHandler::new(debug))),
            debug,
        }
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("hooks", &self.hooks)
            .field("custom_error_handler", &self.error_handler.is_some())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
