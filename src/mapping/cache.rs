use std::collections::HashMap;
use std::time::{Duration, Instant};

use sha1::{Digest, Sha1};

use crate::detect::field_model::Field;
use crate::mapping::mapping_model::{Mapping, Profile};

pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

pub fn sha1_hex(text: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash of a serialized profile. Key order is stable (`BTreeMap`).
pub fn profile_hash(profile: &Profile) -> String {
    let serialized = serde_json::to_string(profile).unwrap_or_default();
    sha1_hex(&serialized)
}

pub fn context_hash(context: &str) -> String {
    sha1_hex(context)
}

/// Hash over the ordered `(locator, semanticType)` pairs of a request.
pub fn fields_hash(fields: &[Field]) -> String {
    let joined = fields
        .iter()
        .map(|f| {
            format!(
                "{}|{}",
                f.selector.to_css(),
                f.semantic_type.map(|t| t.as_str()).unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    sha1_hex(&joined)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub fields_hash: String,
    pub profile_hash: String,
    pub context_hash: String,
}

impl Fingerprint {
    pub fn compute(fields: &[Field], profile: &Profile, context: &str) -> Self {
        Self {
            fields_hash: fields_hash(fields),
            profile_hash: profile_hash(profile),
            context_hash: context_hash(context),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    profile_hash: String,
    context_hash: String,
    mappings: Vec<Mapping>,
    stored_at: Instant,
}

/// Session-scoped suggestion cache for batch resolution.
///
/// Entries are keyed by the fields hash and are only served while younger
/// than the TTL and while the profile and context hashes still match.
#[derive(Debug)]
pub struct SuggestionCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl Default for SuggestionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SuggestionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Valid cached mappings for `fingerprint`. Stale entries are evicted.
    pub fn get(&mut self, fingerprint: &Fingerprint) -> Option<Vec<Mapping>> {
        let entry = self.entries.get(&fingerprint.fields_hash)?;

        let fresh = entry.stored_at.elapsed() < self.ttl;
        let current = entry.profile_hash == fingerprint.profile_hash
            && entry.context_hash == fingerprint.context_hash;

        if fresh && current {
            return Some(entry.mappings.clone());
        }

        self.entries.remove(&fingerprint.fields_hash);
        None
    }

    pub fn put(&mut self, fingerprint: &Fingerprint, mappings: Vec<Mapping>) {
        self.entries.insert(
            fingerprint.fields_hash.clone(),
            CacheEntry {
                profile_hash: fingerprint.profile_hash.clone(),
                context_hash: fingerprint.context_hash.clone(),
                mappings,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
