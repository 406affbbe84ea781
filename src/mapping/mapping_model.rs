use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::detect::field_model::Field;
use crate::selector::locator::Locator;

/// A resolved assignment: which element gets which value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Locator>,
    #[serde(default)]
    pub value: String,
}

impl Mapping {
    pub fn for_field(field: &Field, value: &str) -> Self {
        Self {
            index: Some(field.index),
            selector: Some(field.selector.clone()),
            value: value.to_string(),
        }
    }

    /// Empty mappings mean "no suggestion" and are never applied.
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Canonical profile keys. Profiles may hold other keys too.
pub mod profile_keys {
    pub const COMPANY_NAME: &str = "companyName";
    pub const CONTACT_NAME: &str = "contactName";
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const WEBSITE: &str = "website";
    pub const ADDRESS: &str = "address";
    pub const CITY: &str = "city";
    pub const STATE: &str = "state";
    pub const ZIP: &str = "zip";
    pub const COUNTRY: &str = "country";
    pub const LINKEDIN_URL: &str = "linkedinUrl";
    pub const TWITTER_URL: &str = "twitterUrl";
    pub const DESCRIPTION: &str = "description";
    pub const SHORT_DESCRIPTION: &str = "shortDescription";
}

/// User-authored flat map of canonical field names to values.
///
/// Backed by a `BTreeMap` so serialization (and therefore the cache hash)
/// does not depend on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(BTreeMap<String, String>);

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed value for `key`, `None` when missing or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Drop blank values (what the service needs to see).
    pub fn non_empty(&self) -> Profile {
        Profile(
            self.0
                .iter()
                .filter(|(_, v)| !v.trim().is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl FromIterator<(String, String)> for Profile {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Profile(iter.into_iter().collect())
    }
}

/// On-demand suggestion for one field. `value: None` is an explicit "no
/// suggestion" and `reasoning` says why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSuggestion {
    pub value: Option<String>,
    pub reasoning: String,
}

impl FieldSuggestion {
    pub fn none(reasoning: impl Into<String>) -> Self {
        Self {
            value: None,
            reasoning: reasoning.into(),
        }
    }
}

/// Where a batch of mappings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Cache,
    Remote,
    Heuristic,
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionSource::Cache => write!(f, "cache"),
            ResolutionSource::Remote => write!(f, "remote"),
            ResolutionSource::Heuristic => write!(f, "heuristic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchResolution {
    pub mappings: Vec<Mapping>,
    pub source: ResolutionSource,
}
