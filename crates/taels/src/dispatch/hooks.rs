//! Request and response hooks.
//!
//! Request hooks run in ascending `(order, sequence)` and may short-circuit
//! with a response. Response hooks run in descending order so the last
//! request hook to see a request is the first response hook to see its
//! response.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use strum::{Display, EnumString};

use taels_publisher::{OrderedRegistry, PublishError, RegistryError, Request, Response};

/// Pipeline stage a hook belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Before resolution.
    Request,
    /// After a response is available.
    Response,
}

impl Stage {
    /// Parses a textual stage key.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownStage`] for anything other than
    /// `request` or `response`.
    pub fn from_key(key: &str) -> Result<Self, RegistryError> {
        Self::from_str(key).map_err(|_| RegistryError::UnknownStage {
            key: key.to_owned(),
        })
    }

    /// Returns `true` when hooks in this stage run in descending order.
    #[must_use]
    pub const fn runs_descending(self) -> bool {
        matches!(self, Self::Response)
    }
}

/// Runs before resolution.
#[async_trait]
pub trait RequestHook: Send + Sync {
    /// Inspects or amends `request`.
    ///
    /// Returning a response skips the remaining request hooks and
    /// resolution.
    ///
    /// # Errors
    ///
    /// Errors are handed to the error stage.
    async fn on_request(&self, request: &mut Request) -> Result<Option<Response>, PublishError>;
}

/// Reviews the final response.
#[async_trait]
pub trait ResponseHook: Send + Sync {
    /// Inspects `response`, optionally returning a replacement.
    ///
    /// # Errors
    ///
    /// Errors are logged and the response from before the stage is kept.
    async fn on_response(
        &self,
        request: &Request,
        response: &Response,
    ) -> Result<Option<Response>, PublishError>;
}

/// A hook of either kind, for registration by stage key.
#[derive(Clone)]
pub enum Hook {
    /// A request-stage hook.
    Request(Arc<dyn RequestHook>),
    /// A response-stage hook.
    Response(Arc<dyn ResponseHook>),
}

impl Hook {
    /// The stage this hook can run in.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Request(_) => Stage::Request,
            Self::Response(_) => Stage::Response,
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook::{:?}", self.stage())
    }
}

/// Ordered request and response hooks.
#[derive(Clone, Default)]
pub struct HookRegistry {
    request: OrderedRegistry<Arc<dyn RequestHook>>,
    response: OrderedRegistry<Arc<dyn ResponseHook>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request hook and returns its sequence id.
    pub fn add_request_hook(&mut self, order: i32, hook: Arc<dyn RequestHook>) -> u64 {
        self.request.register(order, hook)
    }

    /// Registers a response hook and returns its sequence id.
    pub fn add_response_hook(&mut self, order: i32, hook: Arc<dyn ResponseHook>) -> u64 {
        self.response.register(order, hook)
    }

    /// Registers `hook` under a textual stage key.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownStage`] for an unknown key and
    /// [`RegistryError::StageMismatch`] when the hook cannot run in that
    /// stage.
    pub fn register(&mut self, key: &str, order: i32, hook: Hook) -> Result<u64, RegistryError> {
        let stage = Stage::from_key(key)?;
        if stage != hook.stage() {
            return Err(RegistryError::StageMismatch {
                stage: stage.to_string(),
                hook: match hook {
                    Hook::Request(_) => "request",
                    Hook::Response(_) => "response",
                },
            });
        }
        Ok(match hook {
            Hook::Request(request_hook) => self.add_request_hook(order, request_hook),
            Hook::Response(response_hook) => self.add_response_hook(order, response_hook),
        })
    }

    /// Request hooks in ascending `(order, sequence)`.
    pub fn request_hooks(&self) -> impl Iterator<Item = &Arc<dyn RequestHook>> {
        self.request.iter().map(|entry| entry.item())
    }

    /// Response hooks in descending `(order, sequence)`.
    pub fn response_hooks(&self) -> impl Iterator<Item = &Arc<dyn ResponseHook>> {
        self.response.iter_rev().map(|entry| entry.item())
    }

    /// Number of hooks registered for `stage`.
    #[must_use]
    pub fn len(&self, stage: Stage) -> usize {
        match stage {
            Stage::Request => self.request.len(),
            Stage::Response => self.response.len(),
        }
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    struct Noop;

    #[async_trait]
    impl RequestHook for Noop {
        async fn on_request(
            &self,
            _request: &mut Request,
        ) -> Result<Option<Response>, PublishError> {
            Ok(None)
        }
    }

    #[async_trait]
    impl ResponseHook for Noop {
        async fn on_response(
            &self,
            _request: &Request,
            _response: &Response,
        ) -> Result<Option<Response>, PublishError> {
            Ok(None)
        }
    }

    #[rstest]
    #[case::request("request", Stage::Request)]
    #[case::response("response", Stage::Response)]
    fn parses_stage_keys(#[case] key: &str, #[case] expected: Stage) {
        assert_eq!(Stage::from_key(key), Ok(expected));
        assert_eq!(expected.to_string(), key);
    }

    #[rstest]
    #[case::unknown("before_start")]
    #[case::empty("")]
    #[case::wrong_case("Request")]
    fn rejects_unknown_stage_keys(#[case] key: &str) {
        let mut registry = HookRegistry::new();
        let error = registry
            .register(key, 0, Hook::Request(Arc::new(Noop)))
            .expect_err("unknown stage");
        assert_eq!(
            error,
            RegistryError::UnknownStage {
                key: key.to_owned()
            }
        );
    }

    #[test]
    fn rejects_hooks_in_the_wrong_stage() {
        let mut registry = HookRegistry::new();
        let error = registry
            .register("response", 0, Hook::Request(Arc::new(Noop)))
            .expect_err("mismatched stage");
        assert!(matches!(error, RegistryError::StageMismatch { .. }));
        assert_eq!(registry.len(Stage::Response), 0);
    }

    #[test]
    fn registers_by_key() {
        let mut registry = HookRegistry::new();
        registry
            .register("request", 5, Hook::Request(Arc::new(Noop)))
            .expect("request hook");
        registry
            .register("response", 5, Hook::Response(Arc::new(Noop)))
            .expect("response hook");
        assert_eq!(registry.len(Stage::Request), 1);
        assert_eq!(registry.len(Stage::Response), 1);
        assert!(Stage::Response.runs_descending());
        assert!(!Stage::Request.runs_descending());
    }
}
