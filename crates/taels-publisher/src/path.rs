//! Path decomposition into namespace-tagged segments.
//!
//! A raw, already percent-decoded path such as `/folder/doc/@@edit` becomes a
//! [`Stack`] of [`Segment`]s. Each component is checked against a
//! [`Shortcuts`] table; a matching literal prefix is stripped and the segment
//! is tagged with the namespace the prefix maps to.

use std::collections::VecDeque;
use std::fmt;

use crate::error::RegistryError;

/// Namespace a path segment is addressed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Plain traversal names.
    Default,
    /// Names that address a view on the resolved object.
    View,
    /// Host-defined namespace, only consumable by a custom traverser.
    Custom(String),
}

impl Namespace {
    /// Creates a host-defined namespace.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Returns `true` for [`Namespace::Default`].
    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "default",
            Self::View => "view",
            Self::Custom(name) => name.as_str(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(namespace, name)` unit of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    namespace: Namespace,
    name: String,
}

impl Segment {
    /// Creates a segment in the given namespace.
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    /// Creates a segment in the default namespace.
    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(Namespace::Default, name)
    }

    /// Creates a segment in the view namespace.
    pub fn view(name: impl Into<String>) -> Self {
        Self::new(Namespace::View, name)
    }

    /// The namespace this segment is addressed in.
    #[must_use]
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The segment name with any shortcut prefix removed.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?})", self.namespace, self.name)
    }
}

/// Literal prefix table mapping path prefixes onto namespaces.
///
/// Prefixes are tried in insertion order and the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcuts {
    entries: Vec<(String, Namespace)>,
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self::with_view_prefix(crate::DEFAULT_VIEW_PREFIX)
    }
}

impl Shortcuts {
    /// Creates an empty table; every segment lands in the default namespace.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a table mapping `prefix` onto the view namespace.
    ///
    /// An empty prefix yields an empty table.
    pub fn with_view_prefix(prefix: impl Into<String>) -> Self {
        let literal = prefix.into();
        let mut table = Self::empty();
        if !literal.is_empty() {
            table.entries.push((literal, Namespace::View));
        }
        table
    }

    /// Adds a prefix mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyShortcut`] for an empty prefix, which
    /// would otherwise match every segment.
    pub fn insert(
        &mut self,
        prefix: impl Into<String>,
        namespace: Namespace,
    ) -> Result<(), RegistryError> {
        let literal = prefix.into();
        if literal.is_empty() {
            return Err(RegistryError::EmptyShortcut { namespace });
        }
        self.entries.push((literal, namespace));
        Ok(())
    }

    /// Splits `component` into its namespace and bare name.
    #[must_use]
    pub fn classify<'a>(&self, component: &'a str) -> (Namespace, &'a str) {
        self.entries
            .iter()
            .find_map(|(prefix, namespace)| {
                component
                    .strip_prefix(prefix.as_str())
                    .map(|rest| (namespace.clone(), rest))
            })
            .unwrap_or((Namespace::Default, component))
    }

    /// Returns the first prefix registered for `namespace`.
    #[must_use]
    pub fn prefix_for(&self, namespace: &Namespace) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, candidate)| candidate == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }
}

/// Ordered segments consumed strictly from the front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    segments: VecDeque<Segment>,
}

impl Stack {
    /// Parses a decoded path into a stack.
    ///
    /// Empty components (leading, trailing or doubled `/`) are skipped.
    #[must_use]
    pub fn parse(path: &str, shortcuts: &Shortcuts) -> Self {
        path.split('/')
            .filter(|component| !component.is_empty())
            .map(|component| {
                let (namespace, name) = shortcuts.classify(component);
                Segment::new(namespace, name)
            })
            .collect()
    }

    /// The next segment to consume.
    #[must_use]
    pub fn front(&self) -> Option<&Segment> {
        self.segments.front()
    }

    /// Removes and returns the next segment.
    pub fn pop_front(&mut self) -> Option<Segment> {
        self.segments.pop_front()
    }

    /// Number of unconsumed segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` when every segment has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterates over the unconsumed segments in order.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Re-joins the segments into a path, restoring shortcut prefixes.
    ///
    /// Segments in a namespace without a registered prefix are written with
    /// their bare name.
    #[must_use]
    pub fn to_path(&self, shortcuts: &Shortcuts) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            if !segment.namespace.is_default() {
                if let Some(prefix) = shortcuts.prefix_for(&segment.namespace) {
                    path.push_str(prefix);
                }
            }
            path.push_str(&segment.name);
        }
        path
    }
}

impl FromIterator<Segment> for Stack {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Segment>> for Stack {
    fn from(segments: Vec<Segment>) -> Self {
        Self {
            segments: segments.into(),
        }
    }
}
