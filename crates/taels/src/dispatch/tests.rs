//! Unit tests for the dispatch pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockall::mock;
use rstest::{fixture, rstest};
use taels_publisher::{
    Component, Principal, PublishError, Publisher, Request, ResolveError, Response,
    ResponseFactory, View,
};
use tokio_util::sync::CancellationToken;

use super::*;

#[derive(Debug)]
struct Root;

impl Component for Root {}

#[derive(Debug)]
struct Page(String);

#[async_trait]
impl ResponseFactory for Page {
    async fn respond(&self) -> Result<Response, PublishError> {
        Ok(Response::ok(self.0.clone()))
    }
}

impl View for Page {
    fn response_factory(self: Arc<Self>) -> Option<Arc<dyn ResponseFactory>> {
        Some(self)
    }
}

fn page(body: impl Into<String>) -> Arc<dyn View> {
    Arc::new(Page(body.into()))
}

fn publisher() -> Publisher {
    let mut builder = Publisher::builder(Arc::new(Root));
    builder
        .register_view::<Root, _>("index", |_, _| Ok(page("home")))
        .expect("index view");
    builder
        .register_view::<Root, _>("explode", |_, _| Err(PublishError::message("exploded")))
        .expect("explode view");
    builder
        .register_view::<Root, _>("whoami", |request, _| {
            Ok(page(request.principal().map_or("anonymous", Principal::id)))
        })
        .expect("whoami view");
    builder.build()
}

mock! {
    Handler {}
    #[async_trait]
    impl ErrorHandler for Handler {
        async fn response(
            &self,
            request: &Request,
            error: &PublishError,
        ) -> Result<Response, PublishError>;
        fn default(&self, request: &Request, error: &PublishError) -> Response;
    }
}

/// Records the hook labels in the order they ran.
#[derive(Debug, Default, Clone)]
struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    fn push(&self, label: &str) {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(label.to_owned());
    }

    fn entries(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[fixture]
fn trace() -> Trace {
    Trace::default()
}

struct Tagging {
    label: &'static str,
    trace: Trace,
}

#[async_trait]
impl RequestHook for Tagging {
    async fn on_request(&self, _request: &mut Request) -> Result<Option<Response>, PublishError> {
        self.trace.push(self.label);
        Ok(None)
    }
}

#[async_trait]
impl ResponseHook for Tagging {
    async fn on_response(
        &self,
        _request: &Request,
        _response: &Response,
    ) -> Result<Option<Response>, PublishError> {
        self.trace.push(self.label);
        Ok(None)
    }
}

fn tagging(label: &'static str, trace: &Trace) -> Arc<Tagging> {
    Arc::new(Tagging {
        label,
        trace: trace.clone(),
    })
}

struct ShortCircuit;

#[async_trait]
impl RequestHook for ShortCircuit {
    async fn on_request(&self, _request: &mut Request) -> Result<Option<Response>, PublishError> {
        Ok(Some(Response::text(401, "login required")))
    }
}

struct Login(&'static str);

#[async_trait]
impl RequestHook for Login {
    async fn on_request(&self, request: &mut Request) -> Result<Option<Response>, PublishError> {
        request.set_principal(Principal::new(self.0));
        Ok(None)
    }
}

struct Failing;

#[async_trait]
impl RequestHook for Failing {
    async fn on_request(&self, _request: &mut Request) -> Result<Option<Response>, PublishError> {
        Err(PublishError::message("hook failed"))
    }
}

#[async_trait]
impl ResponseHook for Failing {
    async fn on_response(
        &self,
        _request: &Request,
        _response: &Response,
    ) -> Result<Option<Response>, PublishError> {
        Err(PublishError::message("hook failed"))
    }
}

struct Stamp(&'static str);

#[async_trait]
impl ResponseHook for Stamp {
    async fn on_response(
        &self,
        _request: &Request,
        response: &Response,
    ) -> Result<Option<Response>, PublishError> {
        Ok(Some(response.clone().with_header("x-stamp", self.0)))
    }
}

struct Counting(Arc<AtomicUsize>);

#[async_trait]
impl RequestHook for Counting {
    async fn on_request(&self, _request: &mut Request) -> Result<Option<Response>, PublishError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[tokio::test]
async fn publishes_without_hooks() {
    let dispatcher = PipelineDispatcher::builder(publisher()).build();
    let response = dispatcher.dispatch(Request::get("/")).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.body(), "home");
}

#[rstest]
#[case::missing("/missing", 404, "Not Found")]
#[case::application("/@@explode", 500, "Internal Server Error")]
#[tokio::test]
async fn default_handler_renders_failures(
    #[case] path: &str,
    #[case] status: u16,
    #[case] body: &str,
) {
    let dispatcher = PipelineDispatcher::builder(publisher()).build();
    let response = dispatcher.dispatch(Request::get(path)).await;
    assert_eq!(response.status(), status);
    assert_eq!(response.body(), body);
}

#[rstest]
#[tokio::test]
async fn request_hooks_run_in_ascending_order(trace: Trace) {
    let mut builder = PipelineDispatcher::builder(publisher());
    builder
        .add_request_hook(10, tagging("late", &trace))
        .add_request_hook(-5, tagging("early", &trace))
        .add_request_hook(10, tagging("late-second", &trace));
    builder.build().dispatch(Request::get("/")).await;
    assert_eq!(trace.entries(), ["early", "late", "late-second"]);
}

#[rstest]
#[tokio::test]
async fn response_hooks_run_in_descending_order(trace: Trace) {
    let mut builder = PipelineDispatcher::builder(publisher());
    builder
        .add_response_hook(1, tagging("first", &trace))
        .add_response_hook(2, tagging("second", &trace))
        .add_response_hook(1, tagging("first-again", &trace));
    builder.build().dispatch(Request::get("/")).await;
    assert_eq!(trace.entries(), ["second", "first-again", "first"]);
}

#[rstest]
#[tokio::test]
async fn short_circuit_skips_later_hooks_and_resolution(trace: Trace) {
    let mut builder = PipelineDispatcher::builder(publisher());
    builder
        .add_request_hook(0, Arc::new(ShortCircuit))
        .add_request_hook(1, tagging("skipped", &trace))
        .add_response_hook(0, tagging("reviewed", &trace));
    let response = builder.build().dispatch(Request::get("/@@explode")).await;
    assert_eq!(response.status(), 401);
    assert_eq!(trace.entries(), ["reviewed"]);
}

#[tokio::test]
async fn request_hooks_may_amend_the_request() {
    let mut builder = PipelineDispatcher::builder(publisher());
    builder.add_request_hook(0, Arc::new(Login("alice")));
    let response = builder.build().dispatch(Request::get("/@@whoami")).await;
    assert_eq!(response.body(), "alice");
}

#[tokio::test]
async fn request_hook_failure_reaches_the_error_handler() {
    let mut handler = MockHandler::new();
    handler
        .expect_response()
        .withf(|_, error| error.to_string() == "hook failed")
        .once()
        .returning(|_, _| Ok(Response::text(503, "handled")));
    let mut builder = PipelineDispatcher::builder(publisher());
    builder
        .with_error_handler(Arc::new(handler))
        .add_request_hook(0, Arc::new(Failing));
    let response = builder.build().dispatch(Request::get("/")).await;
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn publication_error_from_handler_uses_default() {
    let mut handler = MockHandler::new();
    handler.expect_response().once().returning(|_, _| {
        Err(PublishError::from(ResolveError::no_default_view("ErrorPage")))
    });
    handler
        .expect_default()
        .withf(|_, error| error.is_publication_error())
        .once()
        .returning(|_, error| Response::text(error.status(), "fallback"));
    let mut builder = PipelineDispatcher::builder(publisher());
    builder.with_error_handler(Arc::new(handler));
    let response = builder.build().dispatch(Request::get("/@@explode")).await;
    assert_eq!(response.status(), 404);
    assert_eq!(response.body(), "fallback");
}

#[tokio::test]
async fn secondary_application_error_yields_fixed_body() {
    let mut handler = MockHandler::new();
    handler
        .expect_response()
        .once()
        .returning(|_, _| Err(PublishError::message("handler broke")));
    handler.expect_default().never();
    let mut builder = PipelineDispatcher::builder(publisher());
    builder.with_error_handler(Arc::new(handler));
    let response = builder.build().dispatch(Request::get("/@@explode")).await;
    assert_eq!(response.status(), 500);
    assert_eq!(response.body(), SECONDARY_ERROR_BODY);
}

#[tokio::test]
async fn secondary_error_in_debug_mode_describes_both_errors() {
    let mut handler = MockHandler::new();
    handler
        .expect_response()
        .once()
        .returning(|_, _| Err(PublishError::message("handler broke")));
    let mut builder = PipelineDispatcher::builder(publisher());
    builder
        .with_debug(true)
        .with_error_handler(Arc::new(handler));
    let response = builder.build().dispatch(Request::get("/@@explode")).await;
    assert_eq!(response.status(), 500);
    assert_eq!(
        response.body(),
        "Error while handling error: handler broke\nStack: exploded"
    );
}

#[rstest]
#[tokio::test]
async fn cancellation_skips_handler_but_not_response_hooks(trace: Trace) {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut handler = MockHandler::new();
    handler.expect_response().never();
    let mut builder = PipelineDispatcher::builder(publisher());
    builder
        .with_error_handler(Arc::new(handler))
        .add_request_hook(0, Arc::new(Counting(Arc::clone(&counter))))
        .add_response_hook(0, tagging("reviewed", &trace));
    let token = CancellationToken::new();
    token.cancel();
    let response = builder
        .build()
        .dispatch(Request::get("/").with_cancellation(token))
        .await;
    assert_eq!(response.status(), 499);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert_eq!(trace.entries(), ["reviewed"]);
}

#[tokio::test]
async fn response_hooks_chain_replacements() {
    let mut builder = PipelineDispatcher::builder(publisher());
    builder
        .add_response_hook(0, Arc::new(Stamp("outer")))
        .add_response_hook(1, Arc::new(Stamp("inner")));
    let response = builder.build().dispatch(Request::get("/")).await;
    assert_eq!(response.header("x-stamp"), Some("inner"));
    assert_eq!(
        response
            .headers()
            .iter()
            .filter(|(name, _)| name == "x-stamp")
            .count(),
        2
    );
}

#[tokio::test]
async fn response_hook_failure_keeps_the_original_response() {
    let mut builder = PipelineDispatcher::builder(publisher());
    builder
        .add_response_hook(0, Arc::new(Failing))
        .add_response_hook(1, Arc::new(Stamp("discarded")));
    let response = builder.build().dispatch(Request::get("/")).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.header("x-stamp"), None);
}

#[test]
fn builder_takes_debug_from_config() {
    let config = taels_config::Config {
        debug: true,
        ..taels_config::Config::default()
    };
    let dispatcher = DispatcherBuilder::from_config(publisher(), &config).build();
    assert!(dispatcher.debug());
}

#[test]
fn register_hook_rejects_unknown_stage() {
    let mut builder = PipelineDispatcher::builder(publisher());
    let error = builder
        .register_hook("error", 0, Hook::Request(Arc::new(ShortCircuit)))
        .expect_err("unknown stage");
    assert_eq!(
        error,
        taels_publisher::RegistryError::UnknownStage {
            key: "error".to_owned()
        }
    );
}
