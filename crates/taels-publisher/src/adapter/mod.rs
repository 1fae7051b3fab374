//! Turns a resolved target into the final response.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::component::Node;
use crate::error::{PublishError, ResolveError};
use crate::request::Request;
use crate::response::{Renderable, RenderableFactory, Response, ResponseFactory};
use crate::view::View;

/// What resolution produced.
#[derive(Clone)]
pub enum ResolvedTarget {
    /// A complete response returned by traversal.
    Response(Response),
    /// A model that produces its own response.
    Factory(Arc<dyn ResponseFactory>),
    /// A view that still has to become a response factory.
    View(Arc<dyn View>),
}

impl ResolvedTarget {
    /// Classifies a model that can be returned without a view.
    ///
    /// Returns `None` when the model needs view resolution.
    #[must_use]
    pub fn from_model(model: &Node) -> Option<Self> {
        if let Some(response) = model.as_response() {
            return Some(Self::Response(response.clone()));
        }
        Arc::clone(model).response_factory().map(Self::Factory)
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Response(_) => "response",
            Self::Factory(_) => "factory",
            Self::View(_) => "view",
        }
    }
}

impl fmt::Debug for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(response) => f.debug_tuple("Response").field(response).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::View(view) => f.debug_tuple("View").field(view).finish(),
        }
    }
}

type Adaptation = dyn Fn(Arc<dyn View>) -> Option<Arc<dyn ResponseFactory>> + Send + Sync;

/// Response-factory adapters keyed by concrete view type.
#[derive(Clone, Default)]
pub struct ResponseFactories {
    adapters: HashMap<TypeId, Arc<Adaptation>>,
}

impl ResponseFactories {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the adapter for views of type `V`, replacing any earlier one.
    pub fn register<V, F>(&mut self, adapt: F)
    where
        V: View,
        F: Fn(Arc<V>) -> Arc<dyn ResponseFactory> + Send + Sync + 'static,
    {
        let adaptation: Arc<Adaptation> = Arc::new(move |view: Arc<dyn View>| {
            let any: Arc<dyn Any + Send + Sync> = view;
            any.downcast::<V>().ok().map(&adapt)
        });
        self.adapters.insert(TypeId::of::<V>(), adaptation);
    }

    /// Registers [`RenderableFactory`] as the adapter for `V`.
    pub fn register_renderable<V>(&mut self)
    where
        V: View + Renderable,
    {
        self.register::<V, _>(|view| -> Arc<dyn ResponseFactory> {
            Arc::new(RenderableFactory::new(view))
        });
    }

    /// Adapts `view` with the adapter registered for its type.
    #[must_use]
    pub fn adapt(&self, view: Arc<dyn View>) -> Option<Arc<dyn ResponseFactory>> {
        self.adapters
            .get(&view.concrete_type_id())
            .and_then(|adapt| adapt(view))
    }

    /// Number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns `true` when no adapters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for ResponseFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFactories")
            .field("len", &self.adapters.len())
            .finish()
    }
}

/// Converts a [`ResolvedTarget`] into a [`Response`].
#[derive(Debug, Clone, Default)]
pub struct ResponseAdapter {
    factories: ResponseFactories,
}

impl ResponseAdapter {
    /// Creates an adapter over `factories`.
    #[must_use]
    pub const fn new(factories: ResponseFactories) -> Self {
        Self { factories }
    }

    /// Produces the response for `target`.
    ///
    /// A view adapts itself first and falls back to the registered adapter
    /// for its type.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotRenderable`] for a view with no adapter,
    /// [`PublishError::Cancelled`] if the request was cancelled, or whatever
    /// the response factory raised.
    pub async fn materialize(
        &self,
        request: &Request,
        target: ResolvedTarget,
    ) -> Result<Response, PublishError> {
        tracing::trace!(
            target: crate::VIEW_TARGET,
            kind = target.kind(),
            "materialising target"
        );
        let factory = match target {
            ResolvedTarget::Response(response) => return Ok(response),
            ResolvedTarget::Factory(factory) => factory,
            ResolvedTarget::View(view) => self.factory_for(view)?,
        };
        request.ensure_active()?;
        factory.respond().await
    }

    fn factory_for(&self, view: Arc<dyn View>) -> Result<Arc<dyn ResponseFactory>, ResolveError> {
        let component = view.type_name();
        Arc::clone(&view)
            .response_factory()
            .or_else(|| self.factories.adapt(view))
            .ok_or_else(|| ResolveError::not_renderable(component))
    }
}
