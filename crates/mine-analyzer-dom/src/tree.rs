//! In-memory host document.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use mine_analyzer_core::{Error, NodeId, Result};

use crate::document::{HostDocument, Rect};
use crate::observer::{
    MutationKind, MutationRecord, ObserveOptions, ObserverEntry, ObserverHandle, Subscription,
};
use crate::selector::Selector;

const BODY: NodeId = NodeId(0);

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    rect: Rect,
}

impl Node {
    fn new(tag: &str, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.to_lowercase(),
            parent,
            children: Vec::new(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            text: String::new(),
            rect: Rect::default(),
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "class" => Some(self.classes.join(" ")),
            "style" => (!self.style.is_empty()).then(|| {
                self.style
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join("; ")
            }),
            _ => self.attributes.get(name).cloned(),
        }
    }

    fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.tag, &self.classes, |name| self.attribute(name))
    }
}

#[derive(Debug)]
struct TreeInner {
    url: String,
    nodes: Vec<Option<Node>>,
    ids: HashMap<String, NodeId>,
    observers: Vec<ObserverEntry>,
}

impl TreeInner {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(Error::NodeNotFound(id))
    }

    fn is_within(&self, node: NodeId, root: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == root {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn walk(&self, from: NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.node(from) {
            out.push(from);
            for child in &node.children {
                self.walk(*child, out);
            }
        }
    }

    fn document_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.walk(BODY, &mut out);
        out
    }

    fn emit(&mut self, target: NodeId, kind: MutationKind) {
        self.observers.retain(|entry| entry.handle.is_connected());

        for entry in &self.observers {
            if !entry.handle.is_delivering() || !entry.options.accepts(&kind) {
                continue;
            }
            let in_scope = if entry.options.subtree {
                self.is_within(target, entry.root)
            } else {
                target == entry.root
            };
            if !in_scope {
                continue;
            }
            let record = MutationRecord {
                target,
                kind: kind.clone(),
            };
            if entry.sender.send(record).is_err() {
                entry.handle.disconnect();
            }
        }
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        if name == "class" {
            let classes = value.split_whitespace().map(str::to_string).collect();
            self.node_mut(id)?.classes = classes;
        } else {
            let previous = self
                .node_mut(id)?
                .attributes
                .insert(name.to_string(), value.to_string());
            if name == "id" {
                if let Some(old) = previous {
                    self.ids.remove(&old);
                }
                self.ids.insert(value.to_string(), id);
            }
        }
        self.emit(
            id,
            MutationKind::Attribute {
                name: name.to_string(),
            },
        );
        Ok(())
    }
}

/// Shared, mutable, in-memory element tree.
///
/// Cloning a `HostTree` yields another handle to the same document, so the
/// page simulator and the analyzer can share it.
#[derive(Debug, Clone)]
pub struct HostTree {
    inner: Arc<RwLock<TreeInner>>,
}

impl HostTree {
    /// Create an empty document containing only a body.
    pub fn new(url: impl Into<String>) -> Self {
        let inner = TreeInner {
            url: url.into(),
            nodes: vec![Some(Node::new("body", None))],
            ids: HashMap::new(),
            observers: Vec::new(),
        };
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TreeInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TreeInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Navigate to another URL.
    pub fn set_url(&self, url: impl Into<String>) {
        self.write().url = url.into();
    }

    /// Append an element with an optional id and an initial class list.
    pub fn append_element(
        &self,
        parent: NodeId,
        tag: &str,
        id: Option<&str>,
        class_name: &str,
    ) -> Result<NodeId> {
        let node = self.create_element(parent, tag)?;
        if let Some(id) = id {
            self.set_attribute(node, "id", id)?;
        }
        if !class_name.is_empty() {
            self.set_class_name(node, class_name)?;
        }
        Ok(node)
    }

    /// Replace the whole class list at once (one mutation record).
    pub fn set_class_name(&self, node: NodeId, class_name: &str) -> Result<()> {
        self.write().set_attribute(node, "class", class_name)
    }

    /// Show or hide an element via `display: none`.
    pub fn set_displayed(&self, node: NodeId, displayed: bool) -> Result<()> {
        if displayed {
            let mut inner = self.write();
            inner.node_mut(node)?.style.remove("display");
            inner.emit(
                node,
                MutationKind::Attribute {
                    name: "style".to_string(),
                },
            );
            Ok(())
        } else {
            self.set_style(node, "display", "none")
        }
    }

    /// Set the layout rectangle (layout changes produce no records).
    pub fn set_rect(&self, node: NodeId, rect: Rect) -> Result<()> {
        self.write().node_mut(node)?.rect = rect;
        Ok(())
    }

    /// Inline style property value.
    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.read()
            .node(node)
            .and_then(|n| n.style.get(property).cloned())
    }

    /// Number of attached nodes, body included.
    pub fn node_count(&self) -> usize {
        self.read().nodes.iter().flatten().count()
    }

    /// Number of live subscriptions.
    pub fn observer_count(&self) -> usize {
        let inner = self.read();
        inner
            .observers
            .iter()
            .filter(|entry| entry.handle.is_connected())
            .count()
    }
}

impl HostDocument for HostTree {
    fn url(&self) -> String {
        self.read().url.clone()
    }

    fn body(&self) -> NodeId {
        BODY
    }

    fn query(&self, selector: &Selector) -> Option<NodeId> {
        let inner = self.read();
        if let Selector::Id(id) = selector {
            return inner.ids.get(id).copied().filter(|n| inner.node(*n).is_some());
        }
        inner
            .document_order()
            .into_iter()
            .find(|id| inner.node(*id).is_some_and(|n| n.matches(selector)))
    }

    fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        let inner = self.read();
        inner
            .document_order()
            .into_iter()
            .filter(|id| inner.node(*id).is_some_and(|n| n.matches(selector)))
            .collect()
    }

    fn contains(&self, node: NodeId) -> bool {
        self.read().node(node).is_some()
    }

    fn class_name(&self, node: NodeId) -> Option<String> {
        self.read().node(node).map(|n| n.classes.join(" "))
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.read()
            .node(node)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.read().node(node).and_then(|n| n.attribute(name))
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        let inner = self.read();
        inner.node(node)?;
        let mut order = Vec::new();
        inner.walk(node, &mut order);
        Some(
            order
                .into_iter()
                .filter_map(|id| inner.node(id).map(|n| n.text.as_str()))
                .collect(),
        )
    }

    fn is_visible(&self, node: NodeId) -> bool {
        let inner = self.read();
        let mut current = Some(node);
        let mut seen_any = false;
        while let Some(id) = current {
            let Some(n) = inner.node(id) else {
                return false;
            };
            seen_any = true;
            if n.style.get("display").map(String::as_str) == Some("none") {
                return false;
            }
            current = n.parent;
        }
        seen_any
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.read().node(node).map(|n| n.rect)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.read()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn create_element(&self, parent: NodeId, tag: &str) -> Result<NodeId> {
        let mut inner = self.write();
        inner.node(parent).ok_or(Error::NodeNotFound(parent))?;

        let id = NodeId(inner.nodes.len() as u64);
        inner.nodes.push(Some(Node::new(tag, Some(parent))));
        inner.node_mut(parent)?.children.push(id);
        inner.emit(parent, MutationKind::ChildList);
        trace!(node = %id, parent = %parent, tag, "element created");
        Ok(id)
    }

    fn remove(&self, node: NodeId) -> Result<()> {
        if node == BODY {
            return Err(Error::InvalidInput("cannot remove the body".to_string()));
        }
        let mut inner = self.write();
        let parent = inner.node(node).ok_or(Error::NodeNotFound(node))?.parent;

        // Emit before detaching so observers scoped to the subtree still match
        if let Some(parent) = parent {
            inner.emit(parent, MutationKind::ChildList);
        }

        let mut doomed = Vec::new();
        inner.walk(node, &mut doomed);
        for id in doomed {
            if let Some(removed) = inner.nodes.get_mut(id.0 as usize).and_then(Option::take) {
                if let Some(element_id) = removed.attributes.get("id") {
                    if inner.ids.get(element_id) == Some(&id) {
                        inner.ids.remove(element_id);
                    }
                }
            }
        }

        if let Some(parent) = parent {
            inner.node_mut(parent)?.children.retain(|child| *child != node);
        }
        Ok(())
    }

    fn add_class(&self, node: NodeId, class: &str) -> Result<()> {
        let mut inner = self.write();
        let entry = inner.node_mut(node)?;
        if entry.classes.iter().any(|c| c == class) {
            return Ok(());
        }
        entry.classes.push(class.to_string());
        inner.emit(
            node,
            MutationKind::Attribute {
                name: "class".to_string(),
            },
        );
        Ok(())
    }

    fn remove_class(&self, node: NodeId, class: &str) -> Result<()> {
        let mut inner = self.write();
        let entry = inner.node_mut(node)?;
        let before = entry.classes.len();
        entry.classes.retain(|c| c != class);
        if entry.classes.len() != before {
            inner.emit(
                node,
                MutationKind::Attribute {
                    name: "class".to_string(),
                },
            );
        }
        Ok(())
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.write().set_attribute(node, name, value)
    }

    fn set_style(&self, node: NodeId, property: &str, value: &str) -> Result<()> {
        let mut inner = self.write();
        inner
            .node_mut(node)?
            .style
            .insert(property.to_string(), value.to_string());
        inner.emit(
            node,
            MutationKind::Attribute {
                name: "style".to_string(),
            },
        );
        Ok(())
    }

    fn set_text(&self, node: NodeId, text: &str) -> Result<()> {
        let mut inner = self.write();
        inner.node_mut(node)?.text = text.to_string();
        inner.emit(node, MutationKind::Text);
        Ok(())
    }

    fn observe(&self, root: NodeId, options: ObserveOptions) -> Result<Subscription> {
        let mut inner = self.write();
        inner.node(root).ok_or(Error::NodeNotFound(root))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = ObserverHandle::new();
        inner.observers.push(ObserverEntry {
            root,
            options,
            sender,
            handle: handle.clone(),
        });
        debug!(root = %root, "mutation subscription registered");
        Ok(Subscription::new(receiver, handle))
    }
}
