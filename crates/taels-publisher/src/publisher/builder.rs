//! Setup-time assembly of a [`Publisher`].

use std::error::Error as StdError;
use std::sync::Arc;

use super::{ErrorView, ErrorViews, Publisher};
use crate::adapter::{ResponseAdapter, ResponseFactories};
use crate::component::{Component, Node};
use crate::consumer::{Consumer, ConsumerChain, Traverser, TraverserRegistry};
use crate::error::{PublishError, RegistryError};
use crate::model::ModelResolver;
use crate::path::{Namespace, Shortcuts};
use crate::registry::Predicate;
use crate::request::Request;
use crate::response::{Renderable, ResponseFactory};
use crate::view::{View, ViewLookup, ViewRegistry, ViewResolver};

struct PendingConsumer {
    order: i32,
    predicate: Predicate,
    consumer: Arc<dyn Consumer>,
}

/// Collects registrations, then freezes them into a [`Publisher`].
///
/// Built-in consumers are registered before any consumer added here, so a
/// host consumer sharing a built-in's order runs after it.
pub struct PublisherBuilder {
    root: Node,
    shortcuts: Shortcuts,
    consumers: Vec<PendingConsumer>,
    traversers: TraverserRegistry,
    views: ViewRegistry,
    view_lookup: Option<Arc<dyn ViewLookup>>,
    factories: ResponseFactories,
    error_views: ErrorViews,
}

impl PublisherBuilder {
    /// Starts a builder with the default `@@` view shortcut.
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self {
            root,
            shortcuts: Shortcuts::default(),
            consumers: Vec::new(),
            traversers: TraverserRegistry::new(),
            views: ViewRegistry::new(),
            view_lookup: None,
            factories: ResponseFactories::new(),
            error_views: ErrorViews::new(),
        }
    }

    /// Replaces the shortcut table.
    pub fn with_shortcuts(&mut self, shortcuts: Shortcuts) -> &mut Self {
        self.shortcuts = shortcuts;
        self
    }

    /// Replaces the shortcut table with a single view prefix.
    pub fn with_view_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.with_shortcuts(Shortcuts::with_view_prefix(prefix))
    }

    /// Adds a shortcut after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyShortcut`] for an empty prefix.
    pub fn add_shortcut(
        &mut self,
        prefix: impl Into<String>,
        namespace: Namespace,
    ) -> Result<&mut Self, RegistryError> {
        self.shortcuts.insert(prefix, namespace)?;
        Ok(self)
    }

    /// Registers a host consumer.
    pub fn add_consumer(
        &mut self,
        order: i32,
        predicate: Predicate,
        consumer: Arc<dyn Consumer>,
    ) -> &mut Self {
        self.consumers.push(PendingConsumer {
            order,
            predicate,
            consumer,
        });
        self
    }

    /// Registers a traverser for every namespace.
    pub fn register_traverser(
        &mut self,
        predicate: Predicate,
        traverser: Arc<dyn Traverser>,
    ) -> &mut Self {
        self.traversers.register(predicate, traverser);
        self
    }

    /// Registers a traverser for one namespace.
    pub fn register_namespace_traverser(
        &mut self,
        namespace: Namespace,
        predicate: Predicate,
        traverser: Arc<dyn Traverser>,
    ) -> &mut Self {
        self.traversers.register_for(namespace, predicate, traverser);
        self
    }

    /// Registers view `name` for models of type `M`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateView`] if `M` already has a view
    /// called `name`.
    pub fn register_view<M, F>(
        &mut self,
        name: impl Into<String>,
        build: F,
    ) -> Result<&mut Self, RegistryError>
    where
        M: Component,
        F: Fn(&Request, Arc<M>) -> Result<Arc<dyn View>, PublishError> + Send + Sync + 'static,
    {
        self.views.register::<M, F>(name, build)?;
        Ok(self)
    }

    /// Replaces the type-keyed view registry with a custom lookup.
    pub fn with_view_lookup(&mut self, lookup: Arc<dyn ViewLookup>) -> &mut Self {
        self.view_lookup = Some(lookup);
        self
    }

    /// Registers the response-factory adapter for views of type `V`.
    pub fn register_response_factory<V, F>(&mut self, adapt: F) -> &mut Self
    where
        V: View,
        F: Fn(Arc<V>) -> Arc<dyn ResponseFactory> + Send + Sync + 'static,
    {
        self.factories.register::<V, F>(adapt);
        self
    }

    /// Renders views of type `V` through their [`Renderable`] impl.
    pub fn register_renderable<V>(&mut self) -> &mut Self
    where
        V: View + Renderable,
    {
        self.factories.register_renderable::<V>();
        self
    }

    /// Registers the error view for errors of type `E`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateErrorView`] if `E` already has one.
    pub fn register_error_view<E>(
        &mut self,
        view: Arc<dyn ErrorView>,
    ) -> Result<&mut Self, RegistryError>
    where
        E: StdError + 'static,
    {
        self.error_views.register::<E>(view)?;
        Ok(self)
    }

    /// Freezes the registrations.
    #[must_use]
    pub fn build(self) -> Publisher {
        let mut chain = ConsumerChain::with_builtins(Arc::new(self.traversers));
        for pending in self.consumers {
            chain.add_consumer(pending.order, pending.predicate, pending.consumer);
        }
        let lookup = self
            .view_lookup
            .unwrap_or_else(|| Arc::new(self.views) as Arc<dyn ViewLookup>);
        Publisher {
            root: self.root,
            shortcuts: self.shortcuts,
            models: ModelResolver::new(chain),
            views: ViewResolver::new(lookup),
            adapter: ResponseAdapter::new(self.factories),
            error_views: self.error_views,
        }
    }
}
