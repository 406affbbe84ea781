use crate::detect::field_model::{Field, SemanticType};
use crate::mapping::mapping_model::{Mapping, Profile, profile_keys};
use crate::mapping::url_shape::looks_like_url;

/// Profile key that directly backs a semantic type, if any.
///
/// First and last name are derived (see `heuristic_value`); video and deck
/// URLs and every narrative type have no counterpart.
pub fn profile_key(semantic_type: SemanticType) -> Option<&'static str> {
    match semantic_type {
        SemanticType::Email => Some(profile_keys::EMAIL),
        SemanticType::Phone => Some(profile_keys::PHONE),
        SemanticType::CompanyName => Some(profile_keys::COMPANY_NAME),
        SemanticType::ContactName => Some(profile_keys::CONTACT_NAME),
        SemanticType::FirstName => Some(profile_keys::FIRST_NAME),
        SemanticType::LastName => Some(profile_keys::LAST_NAME),
        SemanticType::Address => Some(profile_keys::ADDRESS),
        SemanticType::City => Some(profile_keys::CITY),
        SemanticType::State => Some(profile_keys::STATE),
        SemanticType::Zip => Some(profile_keys::ZIP),
        SemanticType::Country => Some(profile_keys::COUNTRY),
        SemanticType::Website => Some(profile_keys::WEBSITE),
        SemanticType::LinkedinUrl => Some(profile_keys::LINKEDIN_URL),
        SemanticType::TwitterUrl => Some(profile_keys::TWITTER_URL),
        SemanticType::Description => Some(profile_keys::DESCRIPTION),
        SemanticType::ShortDescription => Some(profile_keys::SHORT_DESCRIPTION),
        _ => None,
    }
}

/// Split a stored full name: first token and, when there is more than one
/// token, last token.
pub fn split_full_name(full: &str) -> (Option<&str>, Option<&str>) {
    let tokens: Vec<&str> = full.split_whitespace().collect();
    match tokens.as_slice() {
        [] => (None, None),
        [only] => (Some(*only), None),
        [first, .., last] => (Some(*first), Some(*last)),
    }
}

/// Deterministic value for one field from the profile, or `None` when no
/// safe value exists.
pub fn heuristic_value(field: &Field, profile: &Profile) -> Option<String> {
    let semantic_type = field.semantic_type?;

    if semantic_type.is_narrative()
        || matches!(semantic_type, SemanticType::VideoUrl | SemanticType::PitchDeckUrl)
    {
        return None;
    }

    let value = match semantic_type {
        SemanticType::FirstName => profile
            .get(profile_keys::FIRST_NAME)
            .or_else(|| split_full_name(profile.get(profile_keys::CONTACT_NAME)?).0),
        SemanticType::LastName => profile
            .get(profile_keys::LAST_NAME)
            .or_else(|| split_full_name(profile.get(profile_keys::CONTACT_NAME)?).1),
        other => profile.get(profile_key(other)?),
    }?;

    if semantic_type.is_url_like() && !looks_like_url(value) {
        tracing::debug!(
            field = field.index,
            semantic_type = %semantic_type,
            "stored value is not URL-shaped; skipping"
        );
        return None;
    }

    Some(value.to_string())
}

/// Local fallback used when the remote service yields nothing.
pub fn heuristic_mappings(fields: &[Field], profile: &Profile) -> Vec<Mapping> {
    fields
        .iter()
        .filter_map(|field| {
            heuristic_value(field, profile).map(|value| Mapping::for_field(field, &value))
        })
        .collect()
}
