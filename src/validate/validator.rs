use crate::detect::field_model::Field;
use crate::dom::document::{Document, EventKind, NodeId};
use crate::mapping::mapping_model::Mapping;
use crate::mapping::url_shape::looks_like_url;
use crate::validate::report_model::{ValidationReport, Violation, ViolationReason};

/// Post-fill check from DOM state only.
///
/// For every applied, non-empty mapping: re-read the live value, flag
/// `value_mismatch` when it differs from what was written, and `not_url`
/// when a URL-typed field holds a non-URL value. With `clear_wrong` each
/// offending field is emptied (with input/change events) and counted in
/// `fixed_count`. Elements that disappeared are skipped: targets are only
/// found through their locator, never by position in the mutated page.
pub fn validate_fill(
    doc: &mut Document,
    fields: &[Field],
    mappings: &[Mapping],
    clear_wrong: bool,
) -> ValidationReport {
    let mut violations = vec![];
    let mut fixed_count = 0;
    let mut checked = 0;

    for mapping in mappings.iter().filter(|m| !m.is_empty()) {
        let Some(el) = locate(doc, fields, mapping) else {
            continue;
        };
        checked += 1;

        let field = field_for(fields, mapping);
        let actual = doc.value(el).to_string();
        let expected = mapping.value.trim().to_string();

        let reason = if !value_stuck(doc, el, &actual, &expected) {
            Some(ViolationReason::ValueMismatch)
        } else if field
            .and_then(|f| f.semantic_type)
            .is_some_and(|t| t.is_url_like())
            && !actual.trim().is_empty()
            && !looks_like_url(&actual)
        {
            Some(ViolationReason::NotUrl)
        } else {
            None
        };

        let Some(reason) = reason else {
            continue;
        };

        let mut cleared = false;
        if clear_wrong && doc.set_value(el, "") {
            doc.dispatch(el, EventKind::Input);
            doc.dispatch(el, EventKind::Change);
            cleared = doc.value(el).is_empty();
            if cleared {
                fixed_count += 1;
            }
        }

        let label = field
            .map(Field::display_label)
            .unwrap_or_else(|| expected.clone());
        tracing::info!(%reason, field = %label, cleared, "fill validation finding");

        violations.push(Violation {
            selector: field
                .map(|f| f.selector.clone())
                .or_else(|| mapping.selector.clone()),
            index: field.map(|f| f.index).or(mapping.index),
            label,
            reason,
            expected,
            actual,
            cleared,
        });
    }

    ValidationReport {
        ok: violations.is_empty(),
        violations,
        fixed_count,
        checked,
    }
}

/// The mapping's own locator, else the locator detection gave the field
/// with the mapping's index.
fn locate(doc: &Document, fields: &[Field], mapping: &Mapping) -> Option<NodeId> {
    match &mapping.selector {
        Some(selector) => selector.resolve(doc),
        None => field_for(fields, mapping).and_then(|f| f.selector.resolve(doc)),
    }
}

fn field_for<'a>(fields: &'a [Field], mapping: &Mapping) -> Option<&'a Field> {
    mapping
        .selector
        .as_ref()
        .and_then(|s| fields.iter().find(|f| &f.selector == s))
        .or_else(|| {
            let index = mapping.index?;
            fields.iter().find(|f| f.index == index)
        })
}

/// Whether the written value is what the page now holds. Selects store the
/// option value, so writing an option's visible text also counts.
fn value_stuck(doc: &Document, el: NodeId, actual: &str, expected: &str) -> bool {
    let actual = actual.trim();
    if actual == expected {
        return true;
    }
    if doc.tag(el) != "select" || actual.is_empty() {
        return false;
    }
    actual.eq_ignore_ascii_case(expected)
        || doc
            .selected_text(el)
            .is_some_and(|t| t.eq_ignore_ascii_case(expected))
}
