use serde::{Deserialize, Serialize};

use crate::selector::locator::Locator;

/// Closed set of meanings a detected field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SemanticType {
    // Contact
    Email,
    Phone,
    // Identity
    CompanyName,
    FirstName,
    LastName,
    ContactName,
    // Location
    Address,
    City,
    State,
    Zip,
    Country,
    // URLs
    VideoUrl,
    PitchDeckUrl,
    LinkedinUrl,
    TwitterUrl,
    Website,
    // Free text
    ShortDescription,
    Description,
    // Business narrative
    Traction,
    Problem,
    Solution,
    WhyNow,
    Team,
    FundingAmount,
    MarketSize,
    Competitors,
    UniqueAdvantage,
    ReferralSource,
    InvestorContext,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Email => "email",
            SemanticType::Phone => "phone",
            SemanticType::CompanyName => "companyName",
            SemanticType::FirstName => "firstName",
            SemanticType::LastName => "lastName",
            SemanticType::ContactName => "contactName",
            SemanticType::Address => "address",
            SemanticType::City => "city",
            SemanticType::State => "state",
            SemanticType::Zip => "zip",
            SemanticType::Country => "country",
            SemanticType::VideoUrl => "videoUrl",
            SemanticType::PitchDeckUrl => "pitchDeckUrl",
            SemanticType::LinkedinUrl => "linkedinUrl",
            SemanticType::TwitterUrl => "twitterUrl",
            SemanticType::Website => "website",
            SemanticType::ShortDescription => "shortDescription",
            SemanticType::Description => "description",
            SemanticType::Traction => "traction",
            SemanticType::Problem => "problem",
            SemanticType::Solution => "solution",
            SemanticType::WhyNow => "whyNow",
            SemanticType::Team => "team",
            SemanticType::FundingAmount => "fundingAmount",
            SemanticType::MarketSize => "marketSize",
            SemanticType::Competitors => "competitors",
            SemanticType::UniqueAdvantage => "uniqueAdvantage",
            SemanticType::ReferralSource => "referralSource",
            SemanticType::InvestorContext => "investorContext",
        }
    }

    /// Types whose value must be URL-shaped.
    pub fn is_url_like(&self) -> bool {
        matches!(
            self,
            SemanticType::VideoUrl
                | SemanticType::PitchDeckUrl
                | SemanticType::LinkedinUrl
                | SemanticType::TwitterUrl
                | SemanticType::Website
        )
    }

    /// Types that need a written answer, not a stored fact.
    pub fn is_narrative(&self) -> bool {
        matches!(
            self,
            SemanticType::Traction
                | SemanticType::Problem
                | SemanticType::Solution
                | SemanticType::WhyNow
                | SemanticType::Team
                | SemanticType::FundingAmount
                | SemanticType::MarketSize
                | SemanticType::Competitors
                | SemanticType::UniqueAdvantage
                | SemanticType::ReferralSource
                | SemanticType::InvestorContext
        )
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected candidate input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Ordinal among candidates in the detection pass that produced it.
    pub index: usize,
    pub selector: Locator,
    pub tag: String,
    /// `type` attribute for inputs; `textarea` / `select` for those tags.
    pub input_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub semantic_type: Option<SemanticType>,
    #[serde(default)]
    pub current_value: String,
}

impl Field {
    /// Best human-readable name for reports and prompts.
    pub fn display_label(&self) -> String {
        self.label
            .as_deref()
            .or(self.placeholder.as_deref())
            .or(self.name.as_deref())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("Field {}", self.index))
    }

    pub fn is_textarea(&self) -> bool {
        self.tag == "textarea"
    }

    pub fn has_value(&self) -> bool {
        !self.current_value.trim().is_empty()
    }
}
