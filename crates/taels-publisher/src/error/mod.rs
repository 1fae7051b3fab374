//! Domain errors raised while publishing a request.
//!
//! Resolution failures are distinct from application failures: the former
//! describe a path that cannot be mapped onto the object graph, the latter
//! wrap whatever a consumer, view or factory raised. Both are cheap to clone
//! so the dispatcher can hand the same error to several observers.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::path::Namespace;

/// A path could not be mapped onto a renderable target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// More than one segment was left after traversal stalled.
    #[error("stack not fully consumed: {leftover:?} remain on {object}")]
    AmbiguousPath {
        /// Type name of the object traversal stopped on.
        object: String,
        /// Names of the unconsumed segments.
        leftover: Vec<String>,
    },

    /// The single leftover segment sits in a namespace views cannot use.
    #[error("namespace {namespace} not supported (segment {name:?})")]
    UnsupportedNamespace {
        /// The offending namespace.
        namespace: Namespace,
        /// Segment name.
        name: String,
    },

    /// No `index` view is registered for the resolved object.
    #[error("no default view on {object}")]
    NoDefaultView {
        /// Type name of the resolved object.
        object: String,
    },

    /// An explicit view-namespace lookup found nothing.
    #[error("no view named {name:?} on {object}")]
    NoNamedView {
        /// Requested view name.
        name: String,
        /// Type name of the resolved object.
        object: String,
    },

    /// A default-namespace segment was neither traversable nor a view.
    #[error("{name:?} is neither a view nor a model on {object}")]
    NeitherViewNorModel {
        /// Segment name.
        name: String,
        /// Type name of the resolved object.
        object: String,
    },

    /// A resolved view has no way to become a response factory.
    #[error("view {component} cannot be rendered as a response")]
    NotRenderable {
        /// Type name of the view component.
        component: String,
    },
}

impl ResolveError {
    /// Builds an [`ResolveError::AmbiguousPath`].
    pub fn ambiguous_path<I, S>(object: impl Into<String>, leftover: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AmbiguousPath {
            object: object.into(),
            leftover: leftover.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds an [`ResolveError::UnsupportedNamespace`].
    pub fn unsupported_namespace(namespace: Namespace, name: impl Into<String>) -> Self {
        Self::UnsupportedNamespace {
            namespace,
            name: name.into(),
        }
    }

    /// Builds a [`ResolveError::NoDefaultView`].
    pub fn no_default_view(object: impl Into<String>) -> Self {
        Self::NoDefaultView {
            object: object.into(),
        }
    }

    /// Builds a [`ResolveError::NoNamedView`].
    pub fn no_named_view(name: impl Into<String>, object: impl Into<String>) -> Self {
        Self::NoNamedView {
            name: name.into(),
            object: object.into(),
        }
    }

    /// Builds a [`ResolveError::NeitherViewNorModel`].
    pub fn neither_view_nor_model(name: impl Into<String>, object: impl Into<String>) -> Self {
        Self::NeitherViewNorModel {
            name: name.into(),
            object: object.into(),
        }
    }

    /// Builds a [`ResolveError::NotRenderable`].
    pub fn not_renderable(component: impl Into<String>) -> Self {
        Self::NotRenderable {
            component: component.into(),
        }
    }
}

/// Shared handle to an error raised by host application code.
///
/// The concrete error stays reachable through [`ApplicationError::is`] and
/// [`ApplicationError::downcast_ref`], which is what error views are keyed on.
#[derive(Clone)]
pub struct ApplicationError {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
}

impl ApplicationError {
    /// Wraps a concrete error.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
        }
    }

    /// Wraps a plain message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    /// Returns `true` when the wrapped error is an `E`.
    #[must_use]
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.inner.is::<E>()
    }

    /// Borrows the wrapped error as an `E`.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Borrows the wrapped error.
    #[must_use]
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }
}

impl fmt::Debug for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for ApplicationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct MessageError(String);

/// Any failure surfaced by publishing a request.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// The path could not be resolved to a renderable target.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Host code raised an error.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// The request was cancelled at a suspension point.
    #[error("request cancelled")]
    Cancelled,
}

impl PublishError {
    /// Wraps a host error.
    pub fn application<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Application(ApplicationError::new(error))
    }

    /// Wraps a plain host error message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Application(ApplicationError::from_message(message))
    }

    /// HTTP-style status code for this failure.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Resolve(_) => 404,
            Self::Application(_) => 500,
            Self::Cancelled => 499,
        }
    }

    /// Returns `true` for failures raised by path resolution itself.
    #[must_use]
    pub const fn is_publication_error(&self) -> bool {
        matches!(self, Self::Resolve(_))
    }

    /// Returns `true` for [`PublishError::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The error error views are matched against.
    ///
    /// Resolution failures match on [`ResolveError`] itself; application
    /// failures on the wrapped concrete error.
    #[must_use]
    pub fn subject(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Resolve(error) => Some(error),
            Self::Application(error) => Some(error.get_ref()),
            Self::Cancelled => None,
        }
    }
}

/// Rejected setup-time registrations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A shortcut prefix was empty.
    #[error("shortcut prefix for namespace {namespace} must not be empty")]
    EmptyShortcut {
        /// Namespace the prefix was meant to map onto.
        namespace: Namespace,
    },

    /// A view with the same name is already registered for the type.
    #[error("view {name:?} is already registered for {type_name}")]
    DuplicateView {
        /// Model type name.
        type_name: &'static str,
        /// View name.
        name: String,
    },

    /// An error view for the same error type is already registered.
    #[error("an error view is already registered for {type_name}")]
    DuplicateErrorView {
        /// Error type name.
        type_name: &'static str,
    },

    /// A hook was registered against a stage key that does not exist.
    #[error("unknown pipeline stage {key:?}")]
    UnknownStage {
        /// The rejected key.
        key: String,
    },

    /// A hook was registered against a stage it cannot run in.
    #[error("{hook} hooks cannot run in the {stage} stage")]
    StageMismatch {
        /// Requested stage key.
        stage: String,
        /// Kind of hook supplied.
        hook: &'static str,
    },
}
