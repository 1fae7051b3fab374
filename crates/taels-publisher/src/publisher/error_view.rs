//! Views that render a publishing failure.

use std::any::TypeId;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{PublishError, RegistryError};
use crate::request::Request;
use crate::response::Response;

/// Renders a failure as a response.
#[async_trait]
pub trait ErrorView: Send + Sync {
    /// Produces the response for `error`.
    ///
    /// # Errors
    ///
    /// An error raised here propagates to the dispatcher unchanged.
    async fn render(&self, request: &Request, error: &PublishError)
    -> Result<Response, PublishError>;
}

type Matcher = fn(&(dyn StdError + 'static)) -> bool;

fn matches_type<E: StdError + 'static>(error: &(dyn StdError + 'static)) -> bool {
    error.is::<E>()
}

#[derive(Clone)]
struct ErrorViewEntry {
    type_id: TypeId,
    type_name: &'static str,
    matcher: Matcher,
    view: Arc<dyn ErrorView>,
}

/// Error views keyed by the concrete error type they handle.
#[derive(Clone, Default)]
pub struct ErrorViews {
    entries: Vec<ErrorViewEntry>,
}

impl ErrorViews {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the view for errors of type `E`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateErrorView`] if `E` already has one.
    pub fn register<E>(&mut self, view: Arc<dyn ErrorView>) -> Result<(), RegistryError>
    where
        E: StdError + 'static,
    {
        let type_id = TypeId::of::<E>();
        let type_name = std::any::type_name::<E>();
        if self.entries.iter().any(|entry| entry.type_id == type_id) {
            return Err(RegistryError::DuplicateErrorView { type_name });
        }
        self.entries.push(ErrorViewEntry {
            type_id,
            type_name,
            matcher: matches_type::<E>,
            view,
        });
        Ok(())
    }

    /// Finds the view for `error`.
    ///
    /// Cancellation never has an error view.
    #[must_use]
    pub fn lookup(&self, error: &PublishError) -> Option<(&'static str, Arc<dyn ErrorView>)> {
        let subject = error.subject()?;
        self.entries
            .iter()
            .find(|entry| (entry.matcher)(subject))
            .map(|entry| (entry.type_name, Arc::clone(&entry.view)))
    }

    /// Number of registered error views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no error views are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ErrorViews {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| entry.type_name))
            .finish()
    }
}
