//! Capability model for object-graph nodes.
//!
//! The publisher never inspects a node's fields. It asks a [`Component`]
//! which capabilities it offers and drives traversal through those narrow
//! interfaces; anything that offers none simply stops traversal.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::ApplicationError;
use crate::response::{Response, ResponseFactory};

/// Shared handle to a node in the host's object graph.
pub type Node = Arc<dyn Component>;

/// A node the publisher can probe for capabilities.
///
/// Every method has a default that reports the capability as absent, so a
/// plain model only implements what it actually supports.
pub trait Component: Any + Send + Sync + fmt::Debug {
    /// Type name used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Named-attribute traversal.
    fn attributes(&self) -> Option<&dyn AttributeTraversable> {
        None
    }

    /// Keyed item lookup.
    fn items(&self) -> Option<&dyn ItemIndexable> {
        None
    }

    /// The node itself when it is already a complete response.
    fn as_response(&self) -> Option<&Response> {
        None
    }

    /// The node as a zero-argument response producer.
    fn response_factory(self: Arc<Self>) -> Option<Arc<dyn ResponseFactory>> {
        None
    }
}

impl dyn Component {
    /// Returns `true` when the concrete type is `T`.
    #[must_use]
    pub fn is<T: Component>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    /// Borrows the node as its concrete type.
    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    /// [`TypeId`] of the concrete type, used to key registries.
    #[must_use]
    pub fn concrete_type_id(&self) -> TypeId {
        (self as &dyn Any).type_id()
    }
}

/// Converts a node into a shared handle to its concrete type.
///
/// # Errors
///
/// Returns the original node when its concrete type is not `T`.
pub fn downcast_node<T: Component>(node: Node) -> Result<Arc<T>, Node> {
    let any: Arc<dyn Any + Send + Sync> = node.clone();
    any.downcast::<T>().map_err(|_| node)
}

/// Exposes a fixed set of attribute names for traversal.
pub trait AttributeTraversable: Send + Sync {
    /// Names that may be traversed. Anything else is never read.
    fn traversable(&self) -> &[&'static str];

    /// Reads an attribute. Only called for names in [`Self::traversable`].
    fn attribute(&self, name: &str) -> Option<Node>;
}

/// Keyed item lookup that may suspend.
#[async_trait]
pub trait ItemIndexable: Send + Sync {
    /// Looks up `key`.
    ///
    /// # Errors
    ///
    /// [`ItemError::NotFound`] and [`ItemError::TypeMismatch`] make the
    /// item consumer decline; [`ItemError::Failed`] aborts publishing.
    async fn item(&self, key: &str) -> Result<Node, ItemError>;
}

/// Outcome of a failed item lookup.
#[derive(Debug, Clone, Error)]
pub enum ItemError {
    /// No item exists under the key.
    #[error("no item {key:?}")]
    NotFound {
        /// Requested key.
        key: String,
    },

    /// The key is not of a shape the container accepts.
    #[error("key {key:?} does not match the container's key type")]
    TypeMismatch {
        /// Requested key.
        key: String,
    },

    /// Lookup itself failed.
    #[error(transparent)]
    Failed(#[from] ApplicationError),
}

impl ItemError {
    /// Builds an [`ItemError::NotFound`].
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Builds an [`ItemError::TypeMismatch`].
    pub fn type_mismatch(key: impl Into<String>) -> Self {
        Self::TypeMismatch { key: key.into() }
    }
}
