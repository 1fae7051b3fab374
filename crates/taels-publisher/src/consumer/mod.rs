//! Pluggable segment consumers.
//!
//! A [`ConsumerChain`] holds every consumer registration in
//! `(order, sequence)` order. For a given node, [`ConsumerChain::advance`]
//! tries each applicable consumer until one claims the front segment.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::component::{Component, Node};
use crate::error::PublishError;
use crate::path::Stack;
use crate::registry::{OrderedRegistry, Predicate};
use crate::request::Request;

mod builtin;

pub use self::builtin::{
    ATTRIBUTE_CONSUMER_ORDER, AttributeConsumer, ITEM_CONSUMER_ORDER, ItemConsumer,
    TRAVERSER_CONSUMER_ORDER, Traverser, TraverserConsumer, TraverserRegistry,
};

/// A consumer's decision about the front segment.
#[derive(Debug, Clone)]
pub enum Consumption {
    /// The consumer does not handle this segment.
    Declined,
    /// The front segment was consumed and traversal moves to the node.
    Advanced(Node),
}

/// Attempts to advance traversal by exactly one segment.
///
/// Consumers only see the stack. The chain removes the front segment when a
/// consumer returns [`Consumption::Advanced`].
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Inspects `stack.front()` against `node`.
    ///
    /// # Errors
    ///
    /// Any error aborts publishing and reaches the dispatcher's error stage.
    async fn consume(
        &self,
        request: &Request,
        node: &Node,
        stack: &Stack,
    ) -> Result<Consumption, PublishError>;
}

#[derive(Clone)]
struct ConsumerEntry {
    predicate: Predicate,
    consumer: Arc<dyn Consumer>,
}

/// Ordered set of consumer registrations.
#[derive(Clone, Default)]
pub struct ConsumerChain {
    entries: OrderedRegistry<ConsumerEntry>,
}

impl ConsumerChain {
    /// Creates a chain with no consumers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain holding the attribute, item and traverser consumers.
    #[must_use]
    pub fn with_builtins(traversers: Arc<TraverserRegistry>) -> Self {
        let mut chain = Self::new();
        chain.add_consumer(
            ATTRIBUTE_CONSUMER_ORDER,
            Predicate::any(),
            Arc::new(AttributeConsumer),
        );
        chain.add_consumer(ITEM_CONSUMER_ORDER, Predicate::any(), Arc::new(ItemConsumer));
        chain.add_consumer(
            TRAVERSER_CONSUMER_ORDER,
            Predicate::any(),
            Arc::new(TraverserConsumer::new(traversers)),
        );
        chain
    }

    /// Registers a consumer and returns its sequence id.
    pub fn add_consumer(
        &mut self,
        order: i32,
        predicate: Predicate,
        consumer: Arc<dyn Consumer>,
    ) -> u64 {
        self.entries.register(
            order,
            ConsumerEntry {
                predicate,
                consumer,
            },
        )
    }

    /// Consumers applicable to `node`, in the order they are tried.
    #[must_use]
    pub fn applicable(&self, node: &dyn Component) -> Vec<Arc<dyn Consumer>> {
        self.entries
            .iter()
            .filter(|entry| entry.item().predicate.matches(node))
            .map(|entry| Arc::clone(&entry.item().consumer))
            .collect()
    }

    /// Runs one full pass over the applicable consumers.
    ///
    /// Returns the next node when a consumer claimed the front segment. The
    /// caller is responsible for removing that segment.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Cancelled`] when the request is cancelled
    /// before a consumer runs, or whatever a consumer raised.
    pub async fn advance(
        &self,
        request: &Request,
        node: &Node,
        stack: &Stack,
    ) -> Result<Option<Node>, PublishError> {
        for consumer in self.applicable(&**node) {
            request.ensure_active()?;
            if let Consumption::Advanced(next) = consumer.consume(request, node, stack).await? {
                return Ok(Some(next));
            }
        }
        Ok(None)
    }

    /// Number of registered consumers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no consumers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ConsumerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| {
                (
                    entry.order(),
                    entry.sequence(),
                    entry.item().predicate.label(),
                )
            }))
            .finish()
    }
}
