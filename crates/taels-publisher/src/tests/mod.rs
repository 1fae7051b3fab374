//! Crate-level fixtures and behaviour tests.
//!
//! The fixture graph is a small site:
//!
//! ```text
//! Site ─┬─ about      (attribute)
//!       ├─ a          (item, Folder) ── doc (item, Document)
//!       ├─ shelf      (item, Shelf: numeric keys only)
//!       └─ ready      (item, Response)
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::component::{AttributeTraversable, Component, ItemError, ItemIndexable, Node};
use crate::error::PublishError;
use crate::response::{Response, ResponseFactory};
use crate::view::View;


#[derive(Debug, Default)]
pub(crate) struct Folder {
    pub(crate) title: String,
    children: BTreeMap<String, Node>,
}

impl Folder {
    pub(crate) fn new(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            children: BTreeMap::new(),
        }
    }

    pub(crate) fn with_child(mut self, key: &str, node: Node) -> Self {
        self.children.insert(key.to_owned(), node);
        self
    }
}

impl Component for Folder {
    fn items(&self) -> Option<&dyn ItemIndexable> {
        Some(self)
    }
}

#[async_trait]
impl ItemIndexable for Folder {
    async fn item(&self, key: &str) -> Result<Node, ItemError> {
        self.children
            .get(key)
            .cloned()
            .ok_or_else(|| ItemError::not_found(key))
    }
}

#[derive(Debug)]
pub(crate) struct Site {
    folder: Folder,
    about: Node,
    secret: Node,
}

impl Component for Site {
    fn attributes(&self) -> Option<&dyn AttributeTraversable> {
        Some(self)
    }

    fn items(&self) -> Option<&dyn ItemIndexable> {
        Some(&self.folder)
    }
}

impl AttributeTraversable for Site {
    fn traversable(&self) -> &[&'static str] {
        &["about"]
    }

    fn attribute(&self, name: &str) -> Option<Node> {
        match name {
            "about" => Some(Arc::clone(&self.about)),
            "secret" => Some(Arc::clone(&self.secret)),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Document {
    pub(crate) title: String,
}

impl Component for Document {}

/// Only accepts numeric keys.
#[derive(Debug)]
pub(crate) struct Shelf {
    books: Vec<Node>,
}

impl Component for Shelf {
    fn items(&self) -> Option<&dyn ItemIndexable> {
        Some(self)
    }
}

#[async_trait]
impl ItemIndexable for Shelf {
    async fn item(&self, key: &str) -> Result<Node, ItemError> {
        let index: usize = key.parse().map_err(|_| ItemError::type_mismatch(key))?;
        self.books
            .get(index)
            .cloned()
            .ok_or_else(|| ItemError::not_found(key))
    }
}

/// A model that renders itself.
#[derive(Debug)]
pub(crate) struct Feed;

impl Component for Feed {
    fn response_factory(self: Arc<Self>) -> Option<Arc<dyn ResponseFactory>> {
        Some(self)
    }
}

#[async_trait]
impl ResponseFactory for Feed {
    async fn respond(&self) -> Result<Response, PublishError> {
        Ok(Response::ok("feed"))
    }
}

pub(crate) fn document(title: &str) -> Node {
    Arc::new(Document {
        title: title.to_owned(),
    })
}

pub(crate) fn site() -> Node {
    let folder = Folder::new("root")
        .with_child(
            "a",
            Arc::new(Folder::new("a").with_child("doc", document("doc"))),
        )
        .with_child(
            "shelf",
            Arc::new(Shelf {
                books: vec![document("first"), document("second")],
            }),
        )
        .with_child("ready", Arc::new(Response::ok("ready-made")))
        .with_child("feed", Arc::new(Feed));
    Arc::new(Site {
        folder,
        about: document("about"),
        secret: document("secret"),
    })
}

/// View echoing a fixed body, used across test modules.
#[derive(Debug, Clone)]
pub(crate) struct TextView {
    pub(crate) body: String,
}

impl TextView {
    pub(crate) fn shared(body: &str) -> Arc<dyn View> {
        Arc::new(Self {
            body: body.to_owned(),
        })
    }
}

impl View for TextView {
    fn response_factory(self: Arc<Self>) -> Option<Arc<dyn ResponseFactory>> {
        Some(self)
    }
}

#[async_trait]
impl ResponseFactory for TextView {
    async fn respond(&self) -> Result<Response, PublishError> {
        Ok(Response::ok(self.body.clone()))
    }
}

/// Title of a node known to the fixture graph.
pub(crate) fn title_of(node: &Node) -> Option<String> {
    node.downcast_ref::<Document>()
        .map(|document| document.title.clone())
        .or_else(|| node.downcast_ref::<Folder>().map(|folder| folder.title.clone()))
        .or_else(|| node.is::<Shelf>().then(|| "shelf".to_owned()))
        .or_else(|| node.is::<Site>().then(|| "site".to_owned()))
}
