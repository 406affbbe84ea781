use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::dom::document::{Document, NodeId};

/// Attribute injected onto elements that have no usable id or name.
pub const MARKER_ATTR: &str = "data-formpilot-id";
pub const MARKER_PREFIX: &str = "fp";

/// Durable re-identification key for a form element.
///
/// Serialized as `{"kind": "id", "value": "email"}`. Deserialization also
/// accepts the CSS form (`#email`, `[name="email"]`,
/// `[data-formpilot-id="fp_3"]`) since the remote service echoes selectors
/// back as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Locator {
    Id(String),
    Name(String),
    Marker(String),
}

impl Locator {
    pub fn value(&self) -> &str {
        match self {
            Locator::Id(v) | Locator::Name(v) | Locator::Marker(v) => v,
        }
    }

    /// CSS selector equivalent.
    pub fn to_css(&self) -> String {
        match self {
            Locator::Id(v) => format!("#{}", v),
            Locator::Name(v) => format!("[name=\"{}\"]", v),
            Locator::Marker(v) => format!("[{}=\"{}\"]", MARKER_ATTR, v),
        }
    }

    /// Parse the CSS forms produced by `to_css`.
    pub fn parse_css(css: &str) -> Option<Locator> {
        let css = css.trim();
        if let Some(id) = css.strip_prefix('#') {
            return (!id.is_empty()).then(|| Locator::Id(id.to_string()));
        }

        let inner = css.strip_prefix('[')?.strip_suffix(']')?;
        let (attr, quoted) = inner.split_once('=')?;
        let value = quoted
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| quoted.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))?;

        match attr.trim() {
            "name" => Some(Locator::Name(value.to_string())),
            a if a == MARKER_ATTR => Some(Locator::Marker(value.to_string())),
            "id" => Some(Locator::Id(value.to_string())),
            _ => None,
        }
    }

    /// Every attached element this locator matches, in document order.
    pub fn matches(&self, doc: &Document) -> Vec<NodeId> {
        match self {
            Locator::Id(v) => doc.elements_with_attr("id", v),
            Locator::Name(v) => doc.elements_with_attr("name", v),
            Locator::Marker(v) => doc.elements_with_attr(MARKER_ATTR, v),
        }
    }

    /// `querySelector` semantics: first match in document order.
    pub fn resolve(&self, doc: &Document) -> Option<NodeId> {
        self.matches(doc).into_iter().next()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LocatorWire {
    Tagged { kind: String, value: String },
    Css(String),
}

impl<'de> Deserialize<'de> for Locator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match LocatorWire::deserialize(deserializer)? {
            LocatorWire::Tagged { kind, value } => match kind.as_str() {
                "id" => Ok(Locator::Id(value)),
                "name" => Ok(Locator::Name(value)),
                "marker" => Ok(Locator::Marker(value)),
                other => Err(de::Error::custom(format!("unknown locator kind '{}'", other))),
            },
            LocatorWire::Css(css) => Locator::parse_css(&css)
                .ok_or_else(|| de::Error::custom(format!("unrecognized selector '{}'", css))),
        }
    }
}
