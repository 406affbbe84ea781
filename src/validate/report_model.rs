use serde::Serialize;

use crate::selector::locator::Locator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    /// Live value differs from what was written (framework reverted it).
    ValueMismatch,
    /// URL-typed field holds something that is not URL-shaped.
    NotUrl,
}

impl std::fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationReason::ValueMismatch => write!(f, "value_mismatch"),
            ViolationReason::NotUrl => write!(f, "not_url"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub selector: Option<Locator>,
    pub index: Option<usize>,
    pub label: String,
    pub reason: ViolationReason,
    pub expected: String,
    pub actual: String,
    pub cleared: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub ok: bool,
    pub violations: Vec<Violation>,
    pub fixed_count: usize,
    /// Fields re-read during validation.
    pub checked: usize,
}

impl ValidationReport {
    /// Human status line, e.g. "Filled 3 fields, cleared 1 invalid value".
    pub fn status_line(&self, filled: usize) -> String {
        let mut line = format!("Filled {} {}", filled, plural(filled, "field", "fields"));
        if self.fixed_count > 0 {
            line.push_str(&format!(
                ", cleared {} invalid {}",
                self.fixed_count,
                plural(self.fixed_count, "value", "values")
            ));
        }
        let unresolved = self.violations.iter().filter(|v| !v.cleared).count();
        if unresolved > 0 {
            line.push_str(&format!(
                ", {} {} review",
                unresolved,
                plural(unresolved, "field needs", "fields need")
            ));
        }
        line
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}
