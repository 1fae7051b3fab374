//! Consumers registered on every chain.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Consumer, Consumption};
use crate::component::{ItemError, Node};
use crate::error::PublishError;
use crate::path::{Namespace, Stack};
use crate::registry::Predicate;
use crate::request::Request;

/// Order of [`AttributeConsumer`].
pub const ATTRIBUTE_CONSUMER_ORDER: i32 = 100;
/// Order of [`ItemConsumer`].
pub const ITEM_CONSUMER_ORDER: i32 = 200;
/// Order of [`TraverserConsumer`].
pub const TRAVERSER_CONSUMER_ORDER: i32 = 300;

/// Reads a declared traversable attribute named by a default-namespace
/// segment.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeConsumer;

#[async_trait]
impl Consumer for AttributeConsumer {
    async fn consume(
        &self,
        _request: &Request,
        node: &Node,
        stack: &Stack,
    ) -> Result<Consumption, PublishError> {
        let (Some(attributes), Some(segment)) = (node.attributes(), stack.front()) else {
            return Ok(Consumption::Declined);
        };
        let name = segment.name();
        let declared = attributes
            .traversable()
            .iter()
            .any(|allowed| *allowed == name);
        if !segment.namespace().is_default() || !declared {
            return Ok(Consumption::Declined);
        }
        Ok(attributes
            .attribute(name)
            .map_or(Consumption::Declined, Consumption::Advanced))
    }
}

/// Looks up a default-namespace segment as a keyed item.
///
/// Missing keys and key type mismatches decline rather than fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct ItemConsumer;

#[async_trait]
impl Consumer for ItemConsumer {
    async fn consume(
        &self,
        _request: &Request,
        node: &Node,
        stack: &Stack,
    ) -> Result<Consumption, PublishError> {
        let (Some(items), Some(segment)) = (node.items(), stack.front()) else {
            return Ok(Consumption::Declined);
        };
        if !segment.namespace().is_default() {
            return Ok(Consumption::Declined);
        }
        match items.item(segment.name()).await {
            Ok(next) => Ok(Consumption::Advanced(next)),
            Err(ItemError::NotFound { .. } | ItemError::TypeMismatch { .. }) => {
                Ok(Consumption::Declined)
            }
            Err(ItemError::Failed(error)) => Err(PublishError::Application(error)),
        }
    }
}

/// Explicit traversal for a node type, in any namespace.
#[async_trait]
pub trait Traverser: Send + Sync {
    /// Resolves `name` in `namespace` below `node`.
    ///
    /// Returning `Ok(None)` declines the segment.
    ///
    /// # Errors
    ///
    /// Any error aborts publishing.
    async fn traverse(
        &self,
        request: &Request,
        node: &Node,
        namespace: &Namespace,
        name: &str,
    ) -> Result<Option<Node>, PublishError>;
}

#[derive(Clone)]
struct TraverserEntry {
    predicate: Predicate,
    namespace: Option<Namespace>,
    traverser: Arc<dyn Traverser>,
}

/// Traversers keyed by node predicate and, optionally, namespace.
///
/// The first registration matching both node and namespace wins.
#[derive(Clone, Default)]
pub struct TraverserRegistry {
    entries: Vec<TraverserEntry>,
}

impl TraverserRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a traverser for every namespace.
    pub fn register(&mut self, predicate: Predicate, traverser: Arc<dyn Traverser>) {
        self.entries.push(TraverserEntry {
            predicate,
            namespace: None,
            traverser,
        });
    }

    /// Registers a traverser for a single namespace.
    pub fn register_for(
        &mut self,
        namespace: Namespace,
        predicate: Predicate,
        traverser: Arc<dyn Traverser>,
    ) {
        self.entries.push(TraverserEntry {
            predicate,
            namespace: Some(namespace),
            traverser,
        });
    }

    /// Finds the traverser for `node` in `namespace`.
    #[must_use]
    pub fn lookup(&self, node: &Node, namespace: &Namespace) -> Option<Arc<dyn Traverser>> {
        self.entries
            .iter()
            .find(|entry| {
                entry
                    .namespace
                    .as_ref()
                    .is_none_or(|expected| expected == namespace)
                    && entry.predicate.matches(&**node)
            })
            .map(|entry| Arc::clone(&entry.traverser))
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no traversers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for TraverserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|entry| (entry.predicate.label(), entry.namespace.as_ref())),
            )
            .finish()
    }
}

/// Delegates to a registered [`Traverser`].
#[derive(Debug, Clone)]
pub struct TraverserConsumer {
    traversers: Arc<TraverserRegistry>,
}

impl TraverserConsumer {
    /// Creates a consumer backed by `traversers`.
    #[must_use]
    pub const fn new(traversers: Arc<TraverserRegistry>) -> Self {
        Self { traversers }
    }
}

#[async_trait]
impl Consumer for TraverserConsumer {
    async fn consume(
        &self,
        request: &Request,
        node: &Node,
        stack: &Stack,
    ) -> Result<Consumption, PublishError> {
        let Some(segment) = stack.front() else {
            return Ok(Consumption::Declined);
        };
        let Some(traverser) = self.traversers.lookup(node, segment.namespace()) else {
            return Ok(Consumption::Declined);
        };
        let next = traverser
            .traverse(request, node, segment.namespace(), segment.name())
            .await?;
        Ok(next.map_or(Consumption::Declined, Consumption::Advanced))
    }
}
