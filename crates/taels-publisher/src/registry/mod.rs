//! Priority-ordered registrations with a deterministic tie-break.
//!
//! Every registration carries a caller-assigned `order` and an implicit,
//! monotonically increasing `sequence` id. Entries are kept sorted by
//! `(order, sequence)`, so two registrations sharing an `order` are always
//! visited in the order they were registered.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::component::Component;

/// One entry in an [`OrderedRegistry`].
#[derive(Debug, Clone)]
pub struct Registration<T> {
    order: i32,
    sequence: u64,
    item: T,
}

impl<T> Registration<T> {
    /// Caller-assigned priority. Lower runs first.
    #[must_use]
    pub const fn order(&self) -> i32 {
        self.order
    }

    /// Registration counter used to break ties.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The registered value.
    #[must_use]
    pub const fn item(&self) -> &T {
        &self.item
    }

    const fn key(&self) -> (i32, u64) {
        (self.order, self.sequence)
    }
}

/// Append-only list sorted by `(order, sequence)`.
#[derive(Debug, Clone)]
pub struct OrderedRegistry<T> {
    entries: Vec<Registration<T>>,
    next_sequence: u64,
}

impl<T> Default for OrderedRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_sequence: 0,
        }
    }
}

impl<T> OrderedRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `item` at `order` and returns its sequence id.
    pub fn register(&mut self, order: i32, item: T) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let registration = Registration {
            order,
            sequence,
            item,
        };
        let index = self
            .entries
            .partition_point(|entry| entry.key() <= registration.key());
        self.entries.insert(index, registration);
        sequence
    }

    /// Entries in ascending `(order, sequence)`.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Registration<T>> {
        self.entries.iter()
    }

    /// Entries in descending `(order, sequence)`.
    pub fn iter_rev(&self) -> impl Iterator<Item = &Registration<T>> {
        self.entries.iter().rev()
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type Matcher = dyn Fn(&dyn Component) -> bool + Send + Sync;

/// Decides whether a registration applies to a node.
#[derive(Clone)]
pub struct Predicate {
    label: String,
    matcher: Arc<Matcher>,
}

impl Predicate {
    /// Matches every node.
    #[must_use]
    pub fn any() -> Self {
        Self::when("any", |_| true)
    }

    /// Matches nodes whose concrete type is `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        let expected = TypeId::of::<T>();
        Self::when(std::any::type_name::<T>(), move |node| {
            node.concrete_type_id() == expected
        })
    }

    /// Matches nodes accepted by `matcher`.
    pub fn when<F>(label: impl Into<String>, matcher: F) -> Self
    where
        F: Fn(&dyn Component) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            matcher: Arc::new(matcher),
        }
    }

    /// Applies the predicate.
    #[must_use]
    pub fn matches(&self, node: &dyn Component) -> bool {
        (self.matcher)(node)
    }

    /// Human-readable description.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
