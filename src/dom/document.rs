use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to an element inside a `Document`. Only meaningful for the
/// document that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// The two native signals reactive frameworks listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

/// A host-page script bound to one element. It sees every dispatched event
/// and may rewrite the element's live value (e.g. a controlled component
/// re-rendering its own state).
pub type Listener = Box<dyn FnMut(EventKind, &mut String) + Send>;

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    removed: bool,
}

/// Builder for an element subtree, appended with `Document::append`.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub value: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_lowercase(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }
}

/// In-memory model of the host page.
///
/// Elements live in an arena and are addressed by `NodeId`. Removing an
/// element detaches its subtree; detached ids stay valid handles but never
/// resolve through queries again.
pub struct Document {
    nodes: Vec<ElementData>,
    listeners: Vec<(NodeId, Listener)>,
    events: Vec<DomEvent>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an empty `<body>` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![ElementData {
                tag: "body".into(),
                attributes: vec![],
                text: String::new(),
                value: String::new(),
                parent: None,
                children: vec![],
                removed: false,
            }],
            listeners: vec![],
            events: vec![],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append an element subtree under `parent` and return the id of its top
    /// element.
    pub fn append(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ElementData {
            tag: element.tag.clone(),
            attributes: element.attributes.clone(),
            text: element.text.clone(),
            value: String::new(),
            parent: Some(parent),
            children: vec![],
            removed: false,
        });
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }

        for child in element.children {
            self.append(id, child);
        }

        let initial = match &element.value {
            Some(v) => v.clone(),
            None => self.initial_value(id),
        };
        self.nodes[id.0].value = initial;

        id
    }

    fn initial_value(&self, id: NodeId) -> String {
        match self.tag(id) {
            "textarea" => self.nodes[id.0].text.clone(),
            "select" => {
                let options = self.options(id);
                options
                    .iter()
                    .find(|o| self.attr(**o, "selected").is_some())
                    .or(options.first())
                    .map(|o| self.option_value(*o))
                    .unwrap_or_default()
            }
            _ => self.attr(id, "value").unwrap_or("").to_string(),
        }
    }

    fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|d| self.tag(*d) == "option")
            .collect()
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_string(),
            None => self.text_content(option).trim().to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    pub fn tag(&self, id: NodeId) -> &str {
        self.nodes.get(id.0).map(|n| n.tag.as_str()).unwrap_or("")
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![];
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![];
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every attached element in document order (root excluded).
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root())
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        match self.nodes.get(id.0) {
            Some(n) if n.removed => false,
            Some(_) => id == self.root() || self.ancestors(id).last() == Some(&self.root()),
            None => false,
        }
    }

    /// Detach `id` and its subtree from the document.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root() || !self.is_attached(id) {
            return;
        }
        if let Some(parent) = self.parent(id) {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
        let mut subtree = self.descendants(id);
        subtree.push(id);
        for n in subtree {
            self.nodes[n.0].removed = true;
        }
        let nodes = &self.nodes;
        self.listeners.retain(|(target, _)| !nodes[target.0].removed);
    }

    // ------------------------------------------------------------------
    // Attributes and text
    // ------------------------------------------------------------------

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.nodes.get(id.0).and_then(|n| {
            n.attributes
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str())
        })
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.nodes
            .get(id.0)
            .map(|n| n.attributes.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let name = name.to_lowercase();
        if let Some(n) = self.nodes.get_mut(id.0) {
            match n.attributes.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => n.attributes.push((name, value.to_string())),
            }
        }
    }

    /// Attached elements whose attribute `name` equals `value`, in document
    /// order.
    pub fn elements_with_attr(&self, name: &str, value: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|e| self.attr(*e, name) == Some(value))
            .collect()
    }

    pub fn own_text(&self, id: NodeId) -> &str {
        self.nodes.get(id.0).map(|n| n.text.as_str()).unwrap_or("")
    }

    /// Own text plus the text of every descendant, whitespace-joined.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut parts = vec![self.own_text(id).to_string()];
        parts.extend(self.descendants(id).iter().map(|d| self.own_text(*d).to_string()));
        parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether the element or any ancestor is hidden from the user.
    pub fn is_hidden(&self, id: NodeId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .any(|n| self.hides_itself(n))
    }

    fn hides_itself(&self, id: NodeId) -> bool {
        if self.attr(id, "hidden").is_some() || self.attr(id, "aria-hidden") == Some("true") {
            return true;
        }
        match self.attr(id, "style") {
            Some(style) => {
                let compact: String = style
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_lowercase();
                compact.contains("display:none") || compact.contains("visibility:hidden")
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Live values and events
    // ------------------------------------------------------------------

    pub fn value(&self, id: NodeId) -> &str {
        self.nodes.get(id.0).map(|n| n.value.as_str()).unwrap_or("")
    }

    /// Write a live value. Selects only accept one of their options (matched
    /// by value or visible text, case-insensitive); anything else leaves the
    /// select empty. Returns false for detached elements.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> bool {
        if !self.is_attached(id) {
            return false;
        }
        let stored = if self.tag(id) == "select" {
            self.match_option(id, value).unwrap_or_default()
        } else {
            value.to_string()
        };
        self.nodes[id.0].value = stored;
        true
    }

    fn match_option(&self, select: NodeId, wanted: &str) -> Option<String> {
        if wanted.is_empty() {
            return None;
        }
        let wanted_lower = wanted.trim().to_lowercase();
        let options = self.options(select);

        options
            .iter()
            .find(|o| self.option_value(**o) == wanted)
            .or_else(|| {
                options.iter().find(|o| {
                    self.option_value(**o).to_lowercase() == wanted_lower
                        || self.text_content(**o).trim().to_lowercase() == wanted_lower
                })
            })
            .map(|o| self.option_value(*o))
    }

    /// Visible text of the option a select currently holds.
    pub fn selected_text(&self, select: NodeId) -> Option<String> {
        let value = self.value(select);
        if value.is_empty() {
            return None;
        }
        self.options(select)
            .into_iter()
            .find(|o| self.option_value(*o) == value)
            .map(|o| self.text_content(o).trim().to_string())
    }

    /// Register a host-page listener for `id`.
    pub fn add_listener(&mut self, id: NodeId, listener: Listener) {
        self.listeners.push((id, listener));
    }

    /// Dispatch a native event on `id`: record it, then run the element's
    /// listeners in registration order.
    pub fn dispatch(&mut self, id: NodeId, kind: EventKind) {
        if !self.is_attached(id) {
            return;
        }
        self.events.push(DomEvent { target: id, kind });

        let mut value = std::mem::take(&mut self.nodes[id.0].value);
        for (target, listener) in self.listeners.iter_mut() {
            if *target == id {
                listener(kind, &mut value);
            }
        }
        self.nodes[id.0].value = value;
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}
