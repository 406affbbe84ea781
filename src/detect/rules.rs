use std::sync::LazyLock;

use regex::Regex;

use crate::detect::field_model::SemanticType;

/// One entry of the ordered classification table.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub semantic_type: SemanticType,
    pub pattern: &'static str,
    /// URL rules never classify a textarea.
    pub skip_textarea: bool,
}

const fn rule(semantic_type: SemanticType, pattern: &'static str) -> ClassificationRule {
    ClassificationRule {
        semantic_type,
        pattern,
        skip_textarea: false,
    }
}

const fn url_rule(semantic_type: SemanticType, pattern: &'static str) -> ClassificationRule {
    ClassificationRule {
        semantic_type,
        pattern,
        skip_textarea: true,
    }
}

/// First match wins. Specific rules sit above the generic rules they
/// overlap with: video URL before URL, company name before bare name,
/// narrative questions before "describe", short description before
/// description.
pub static RULES: &[ClassificationRule] = &[
    // ---- Contact ----
    rule(SemanticType::Email, r"e-?mail"),
    rule(SemanticType::Phone, r"phone|mobile|\btel\b|telephone|\bcell\b"),
    // ---- URLs, specific first ----
    url_rule(SemanticType::VideoUrl, r"video|youtube|vimeo|\bloom\b"),
    url_rule(SemanticType::PitchDeckUrl, r"pitch[\s_-]*deck|\bdeck\b|docsend|slides"),
    url_rule(SemanticType::LinkedinUrl, r"linked[\s_-]*in"),
    url_rule(SemanticType::TwitterUrl, r"twitter|\bx[\s_-]*handle\b|\bx\.com\b"),
    url_rule(SemanticType::Website, r"website|web[\s_-]site|homepage|company[\s_-]*url"),
    url_rule(SemanticType::Website, r"\burl\b|\blink\b|https?://"),
    // ---- Identity, qualified ----
    rule(
        SemanticType::CompanyName,
        r"(company|business|startup|organi[sz]ation|org)[\s_-]*name",
    ),
    rule(SemanticType::FirstName, r"first[\s_-]*name|given[\s_-]*name|\bfname\b"),
    rule(SemanticType::LastName, r"last[\s_-]*name|surname|family[\s_-]*name|\blname\b"),
    rule(
        SemanticType::ContactName,
        r"full[\s_-]*name|contact[\s_-]*name|your[\s_-]*name|founder[\s_-]*name",
    ),
    // ---- Business narrative ----
    rule(SemanticType::Problem, r"problem|pain[\s_-]*point"),
    rule(SemanticType::Solution, r"solution|how (do|does) \w+ solve"),
    rule(SemanticType::WhyNow, r"why[\s_-]*now|timing"),
    rule(SemanticType::Competitors, r"competit|alternatives"),
    rule(
        SemanticType::UniqueAdvantage,
        r"unique|advantage|differentiat|\bmoat\b|unfair",
    ),
    rule(SemanticType::MarketSize, r"market[\s_-]*size|\btam\b|addressable|market opportunity"),
    rule(SemanticType::FundingAmount, r"raising|\braise\b|funding|round[\s_-]*size|how much"),
    rule(SemanticType::Team, r"\bteam\b|co-?founders?|\bfounders\b"),
    rule(
        SemanticType::Traction,
        r"traction|metrics|revenue|\bmrr\b|\barr\b|growth|how many (users|customers)",
    ),
    rule(SemanticType::ReferralSource, r"hear about|referr|how did you find"),
    rule(SemanticType::InvestorContext, r"investor|\bangels?\b|\bvcs?\b|backed by"),
    // ---- Free text ----
    rule(
        SemanticType::ShortDescription,
        r"one[\s_-]*liner|elevator|tag[\s_-]*line|(short|brief)[\s_-]*description|one sentence|\d+\s*characters",
    ),
    rule(
        SemanticType::Description,
        r"describe|description|about (your|the) (company|startup|business)|what does your (company|startup)|overview|\bbio\b",
    ),
    // ---- Location ----
    rule(SemanticType::Address, r"address|street|\baddr\b"),
    rule(SemanticType::City, r"\bcity\b|\btown\b"),
    rule(SemanticType::State, r"\bstate\b|province|region"),
    rule(SemanticType::Zip, r"\bzip\b|zip[\s_-]*code|postal|postcode"),
    rule(SemanticType::Country, r"country|\bnation(ality)?\b"),
    // ---- Identity, bare ----
    rule(SemanticType::ContactName, r"\bname\b"),
    rule(SemanticType::CompanyName, r"\bcompany\b|\bstartup\b|organi[sz]ation"),
];

struct CompiledRule {
    regex: Regex,
    rule: ClassificationRule,
}

static COMPILED: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .filter_map(|rule| match Regex::new(rule.pattern) {
            Ok(regex) => Some(CompiledRule { regex, rule: *rule }),
            Err(e) => {
                tracing::error!(pattern = rule.pattern, error = %e, "invalid classification rule");
                None
            }
        })
        .collect()
});

/// Number of rules that compiled.
pub fn compiled_rule_count() -> usize {
    COMPILED.len()
}

/// Join the raw text sources into the single lowercase haystack the rules
/// run against.
pub fn build_haystack(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Classify a haystack: first matching rule wins.
pub fn classify_text(haystack: &str, is_textarea: bool) -> Option<SemanticType> {
    if haystack.trim().is_empty() {
        return None;
    }
    let lower = haystack.to_lowercase();
    COMPILED
        .iter()
        .filter(|c| !(is_textarea && c.rule.skip_textarea))
        .find(|c| c.regex.is_match(&lower))
        .map(|c| c.rule.semantic_type)
}

/// Every distinct type whose rule matches, in rule order. More than one
/// entry means the outcome depends on table order.
pub fn matching_types(haystack: &str, is_textarea: bool) -> Vec<SemanticType> {
    let lower = haystack.to_lowercase();
    let mut out: Vec<SemanticType> = vec![];
    for c in COMPILED.iter() {
        if is_textarea && c.rule.skip_textarea {
            continue;
        }
        if c.regex.is_match(&lower) && !out.contains(&c.rule.semantic_type) {
            out.push(c.rule.semantic_type);
        }
    }
    out
}
