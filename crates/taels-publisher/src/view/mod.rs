//! Named views and the rules that pick one for a resolved model.
//!
//! Views are registered per concrete model type and name. The
//! [`ViewResolver`] turns the traversal leftovers into a single
//! `(namespace, name)` lookup and maps every way that can fail onto a
//! [`ResolveError`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::VIEW_TARGET;
use crate::component::{Component, Node, downcast_node};
use crate::error::{PublishError, RegistryError, ResolveError};
use crate::path::{Namespace, Segment, Stack};
use crate::request::Request;
use crate::response::ResponseFactory;

/// Name looked up when the path ends on a model.
pub const DEFAULT_VIEW_NAME: &str = "index";

/// A renderable component resolved against a model.
pub trait View: Any + Send + Sync + fmt::Debug {
    /// Type name used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The view as its own response factory.
    ///
    /// Views that return `None` need an adapter registered with
    /// [`crate::ResponseFactories`].
    fn response_factory(self: Arc<Self>) -> Option<Arc<dyn ResponseFactory>> {
        None
    }
}

impl dyn View {
    /// Returns `true` when the concrete type is `T`.
    #[must_use]
    pub fn is<T: View>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    /// Borrows the view as its concrete type.
    #[must_use]
    pub fn downcast_ref<T: View>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    /// [`TypeId`] of the concrete type.
    #[must_use]
    pub fn concrete_type_id(&self) -> TypeId {
        (self as &dyn Any).type_id()
    }
}

/// Finds a view for a model.
#[async_trait]
pub trait ViewLookup: Send + Sync {
    /// Looks up the view `name` in `namespace` for `model`.
    ///
    /// # Errors
    ///
    /// Errors raised while constructing the view.
    async fn lookup(
        &self,
        request: &Request,
        model: &Node,
        namespace: &Namespace,
        name: &str,
    ) -> Result<Option<Arc<dyn View>>, PublishError>;
}

type ViewBuilder = dyn Fn(&Request, &Node) -> Result<Option<Arc<dyn View>>, PublishError> + Send + Sync;

/// Views keyed by concrete model type and view name.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    builders: HashMap<(TypeId, String), Arc<ViewBuilder>>,
}

impl ViewRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers view `name` for models of type `M`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateView`] if `M` already has a view
    /// called `name`.
    pub fn register<M, F>(&mut self, name: impl Into<String>, build: F) -> Result<(), RegistryError>
    where
        M: Component,
        F: Fn(&Request, Arc<M>) -> Result<Arc<dyn View>, PublishError> + Send + Sync + 'static,
    {
        let key = (TypeId::of::<M>(), name.into());
        if self.builders.contains_key(&key) {
            return Err(RegistryError::DuplicateView {
                type_name: std::any::type_name::<M>(),
                name: key.1,
            });
        }
        let builder: Arc<ViewBuilder> = Arc::new(move |request: &Request, model: &Node| {
            downcast_node::<M>(Arc::clone(model))
                .ok()
                .map(|typed| build(request, typed))
                .transpose()
        });
        self.builders.insert(key, builder);
        Ok(())
    }

    /// Returns `true` if `M` has a view called `name`.
    #[must_use]
    pub fn contains<M: Component>(&self, name: &str) -> bool {
        self.builders
            .contains_key(&(TypeId::of::<M>(), name.to_owned()))
    }

    /// Number of registered views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Returns `true` when no views are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.builders.keys().map(|(_, name)| name))
            .finish()
    }
}

#[async_trait]
impl ViewLookup for ViewRegistry {
    async fn lookup(
        &self,
        request: &Request,
        model: &Node,
        _namespace: &Namespace,
        name: &str,
    ) -> Result<Option<Arc<dyn View>>, PublishError> {
        let key = (model.concrete_type_id(), name.to_owned());
        match self.builders.get(&key) {
            Some(build) => build(request, model),
            None => Ok(None),
        }
    }
}

/// Picks the view for a resolved model and its leftover segments.
#[derive(Clone)]
pub struct ViewResolver {
    lookup: Arc<dyn ViewLookup>,
}

impl ViewResolver {
    /// Creates a resolver over `lookup`.
    #[must_use]
    pub fn new(lookup: Arc<dyn ViewLookup>) -> Self {
        Self { lookup }
    }

    /// Resolves the view addressed by `leftover` on `model`.
    ///
    /// No leftover selects the default view; one leftover names the view;
    /// more than one means traversal stopped too early.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] for every way the lookup can fail, or
    /// whatever the lookup itself raised.
    pub async fn resolve(
        &self,
        request: &Request,
        model: &Node,
        leftover: &Stack,
    ) -> Result<Arc<dyn View>, PublishError> {
        let object = model.type_name();
        if leftover.len() > 1 {
            return Err(
                ResolveError::ambiguous_path(object, leftover.iter().map(Segment::name)).into(),
            );
        }
        let (namespace, name, default_fallback) = match leftover.front() {
            None => (Namespace::View, DEFAULT_VIEW_NAME, true),
            Some(segment) => match segment.namespace() {
                Namespace::Default | Namespace::View => {
                    (segment.namespace().clone(), segment.name(), false)
                }
                other => {
                    return Err(
                        ResolveError::unsupported_namespace(other.clone(), segment.name()).into(),
                    );
                }
            },
        };

        request.ensure_active()?;
        if let Some(view) = self.lookup.lookup(request, model, &namespace, name).await? {
            debug!(
                target: VIEW_TARGET,
                model = object,
                view = view.type_name(),
                view_name = name,
                "view resolved"
            );
            return Ok(view);
        }

        let error = if default_fallback {
            ResolveError::no_default_view(object)
        } else if namespace == Namespace::View {
            ResolveError::no_named_view(name, object)
        } else {
            ResolveError::neither_view_nor_model(name, object)
        };
        Err(error.into())
    }
}

impl fmt::Debug for ViewResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewResolver").finish_non_exhaustive()
    }
}
