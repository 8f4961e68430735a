//! The host document contract.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use mine_analyzer_core::{NodeId, Result};

use crate::observer::{ObserveOptions, Subscription};
use crate::selector::Selector;

/// Page-space rectangle of an element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// An externally controlled, mutable tree of visual elements.
///
/// The analyzer only ever reads from it, except for the overlay renderer
/// which adds its own annotation elements and marker classes. Lookups on
/// removed nodes return `None`/`false`; writes on them fail with
/// [`mine_analyzer_core::Error::NodeNotFound`].
pub trait HostDocument: Send + Sync {
    /// Current page URL.
    fn url(&self) -> String;

    /// The document body (root for annotation layers).
    fn body(&self) -> NodeId;

    /// First element matching a selector, in document order.
    fn query(&self, selector: &Selector) -> Option<NodeId>;

    /// All elements matching a selector, in document order.
    fn query_all(&self, selector: &Selector) -> Vec<NodeId>;

    /// Whether the node is still attached.
    fn contains(&self, node: NodeId) -> bool;

    /// Space-separated class list.
    fn class_name(&self, node: NodeId) -> Option<String>;

    /// Whether the node carries a class token.
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Attribute value.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Text of the node and its descendants.
    fn text_content(&self, node: NodeId) -> Option<String>;

    /// Whether the node and every ancestor are displayed.
    fn is_visible(&self, node: NodeId) -> bool;

    /// Page-space rectangle.
    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    /// Direct children.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Append a new element under `parent`.
    fn create_element(&self, parent: NodeId, tag: &str) -> Result<NodeId>;

    /// Detach a node and its subtree.
    fn remove(&self, node: NodeId) -> Result<()>;

    /// Add a class token (no-op if present).
    fn add_class(&self, node: NodeId, class: &str) -> Result<()>;

    /// Remove a class token (no-op if absent).
    fn remove_class(&self, node: NodeId, class: &str) -> Result<()>;

    /// Set an attribute.
    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()>;

    /// Set an inline style property.
    fn set_style(&self, node: NodeId, property: &str, value: &str) -> Result<()>;

    /// Replace the node's own text.
    fn set_text(&self, node: NodeId, text: &str) -> Result<()>;

    /// Subscribe to mutations under `root`.
    fn observe(&self, root: NodeId, options: ObserveOptions) -> Result<Subscription>;
}
