use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dom::document::{Document, Element, NodeId};
use crate::error::{FormPilotError, Result};

/// Serialized page: one JSON tree node per element, rooted at `<body>`.
///
/// This is the exchange format between a page extractor and the engine:
/// `{"tag": "input", "attrs": {"name": "email"}, "value": "", "children": []}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl From<&NodeSnapshot> for Element {
    fn from(node: &NodeSnapshot) -> Self {
        let mut el = Element::new(&node.tag);
        for (k, v) in &node.attrs {
            el = el.attr(k, v);
        }
        if let Some(text) = &node.text {
            el = el.text(text);
        }
        if let Some(value) = &node.value {
            el = el.value(value);
        }
        el.children = node.children.iter().map(Element::from).collect();
        el
    }
}

/// Build a document from a snapshot tree. A `body` (or `html`) root is
/// unwrapped so its children land directly under the document root.
pub fn document_from_snapshot(root: &NodeSnapshot) -> Result<Document> {
    let mut doc = Document::new();
    let body = doc.root();

    match root.tag.to_lowercase().as_str() {
        "html" => {
            let inner = root
                .children
                .iter()
                .find(|c| c.tag.eq_ignore_ascii_case("body"))
                .ok_or_else(|| FormPilotError::PageStructure("<html> without <body>".into()))?;
            for child in &inner.children {
                doc.append(body, Element::from(child));
            }
        }
        "body" => {
            for child in &root.children {
                doc.append(body, Element::from(child));
            }
        }
        _ => {
            doc.append(body, Element::from(root));
        }
    }

    Ok(doc)
}

/// Serialize the live document (attributes, text and current values).
pub fn snapshot_document(doc: &Document) -> NodeSnapshot {
    snapshot_node(doc, doc.root())
}

fn snapshot_node(doc: &Document, id: NodeId) -> NodeSnapshot {
    let text = doc.own_text(id);
    let value = doc.value(id);
    let carries_value = matches!(doc.tag(id), "input" | "textarea" | "select");

    NodeSnapshot {
        tag: doc.tag(id).to_string(),
        attrs: doc.attributes(id).iter().cloned().collect(),
        text: (!text.is_empty()).then(|| text.to_string()),
        value: (carries_value && !value.is_empty()).then(|| value.to_string()),
        children: doc
            .children(id)
            .iter()
            .map(|c| snapshot_node(doc, *c))
            .collect(),
    }
}

pub fn load_snapshot(path: &Path) -> Result<Document> {
    let raw = std::fs::read_to_string(path).map_err(|e| FormPilotError::Io {
        context: format!("reading page snapshot {}", path.display()),
        source: e,
    })?;
    let root: NodeSnapshot = serde_json::from_str(&raw).map_err(|e| FormPilotError::JsonParse {
        context: format!("page snapshot {}", path.display()),
        source: e,
    })?;
    document_from_snapshot(&root)
}

pub fn save_snapshot(doc: &Document, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&snapshot_document(doc)).map_err(|e| {
        FormPilotError::JsonSerialize {
            context: "page snapshot".into(),
            source: e,
        }
    })?;
    std::fs::write(path, json).map_err(|e| FormPilotError::Io {
        context: format!("writing page snapshot {}", path.display()),
        source: e,
    })
}
