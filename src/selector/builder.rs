use std::sync::LazyLock;

use regex::Regex;

use crate::dom::document::{Document, NodeId};
use crate::selector::locator::{Locator, MARKER_ATTR, MARKER_PREFIX};

static VALID_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").ok());

static VALID_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.:\[\]-]*$").ok());

fn is_match(re: &LazyLock<Option<Regex>>, value: &str) -> bool {
    re.as_ref().is_some_and(|r| r.is_match(value))
}

pub fn is_valid_id(id: &str) -> bool {
    is_match(&VALID_ID, id)
}

pub fn is_valid_name(name: &str) -> bool {
    is_match(&VALID_NAME, name)
}

/// Compute the locator for `el`, the `index`-th candidate of a detection
/// pass.
///
/// Preference: unique valid `id`, then unique valid `name`, then an
/// injected marker attribute. A marker already present on the element is
/// reused so repeated passes keep the same key.
pub fn build_locator(doc: &mut Document, el: NodeId, index: usize) -> Locator {
    if let Some(id) = doc.attr(el, "id").map(str::to_string) {
        if is_valid_id(&id) && doc.elements_with_attr("id", &id) == [el] {
            return Locator::Id(id);
        }
    }

    if let Some(name) = doc.attr(el, "name").map(str::to_string) {
        if is_valid_name(&name) && doc.elements_with_attr("name", &name) == [el] {
            return Locator::Name(name);
        }
    }

    if let Some(existing) = doc.attr(el, MARKER_ATTR).map(str::to_string) {
        if doc.elements_with_attr(MARKER_ATTR, &existing) == [el] {
            return Locator::Marker(existing);
        }
    }

    let marker = free_marker(doc, index);
    doc.set_attr(el, MARKER_ATTR, &marker);
    tracing::debug!(marker = %marker, "injected marker attribute");
    Locator::Marker(marker)
}

/// `fp_<index>`, suffixed when a stale element from an earlier pass already
/// carries that value.
fn free_marker(doc: &Document, index: usize) -> String {
    let base = format!("{}_{}", MARKER_PREFIX, index);
    if doc.elements_with_attr(MARKER_ATTR, &base).is_empty() {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}", base, n);
        if doc.elements_with_attr(MARKER_ATTR, &candidate).is_empty() {
            return candidate;
        }
        n += 1;
    }
}
