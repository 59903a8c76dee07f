//! AI insight domain models.
//!
//! Insights are a closed tagged union: every variant's fields are fully
//! enumerated here, and a fetched insight is always replaced wholesale.
//! The `cached` flags are server metadata; synthesized fallbacks always
//! carry `cached == false` so they are never confused with a genuine
//! server-cached result.

use serde::{Deserialize, Serialize};
use strum::Display;

/// The kind of insight, one per console feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsightKind {
    Summary,
    RefundExplanation,
    KnowledgeBase,
}

/// Cache key for an insight: subject id plus kind.
///
/// The subject is a ticket id for summaries, an order/refund id for
/// explanations, and the query string for knowledge-base searches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsightKey {
    pub subject: String,
    pub kind: InsightKind,
}

impl InsightKey {
    pub fn new(subject: impl Into<String>, kind: InsightKind) -> Self {
        Self {
            subject: subject.into(),
            kind,
        }
    }
}

/// How urgently a ticket needs attention, as judged by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
}

/// AI-generated conversation summary for a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSummary {
    /// Concise summary of the conversation
    pub summary: String,
    /// Key points discussed
    #[serde(default)]
    pub key_points: Vec<String>,
    /// Model confidence in [0, 1]
    pub confidence: f32,
    /// Suggested handling urgency
    #[serde(default)]
    pub urgency: Urgency,
    /// True when the backend served a cached result rather than
    /// generating a fresh one
    #[serde(default)]
    pub cached: bool,
}

impl TicketSummary {
    /// Synthesized placeholder served while the real summary is
    /// unavailable.
    pub fn fallback() -> Self {
        Self {
            summary: "Summary is temporarily unavailable. Review the conversation directly."
                .to_string(),
            key_points: Vec::new(),
            confidence: 0.0,
            urgency: Urgency::Low,
            cached: false,
        }
    }
}

/// AI-generated explanation of a refund/fraud recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundExplanation {
    /// Short recommendation, e.g. "approve" or "manual review"
    pub recommendation: String,
    /// Why the model made that recommendation
    pub explanation: String,
    /// Signals that contributed to the assessment
    #[serde(default)]
    pub risk_factors: Vec<String>,
    /// Model confidence in [0, 1]
    pub confidence: f32,
    #[serde(default)]
    pub cached: bool,
}

impl RefundExplanation {
    pub fn fallback() -> Self {
        Self {
            recommendation: "manual review".to_string(),
            explanation:
                "Automated refund assessment is temporarily unavailable. Review the order manually."
                    .to_string(),
            risk_factors: Vec::new(),
            confidence: 0.0,
            cached: false,
        }
    }
}

/// A knowledge-base article matched by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeArticle {
    pub id: String,
    pub title: String,
    /// Snippet shown in the result list
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Relevance score assigned by the search backend
    pub score: f32,
}

/// The closed union of insight payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum InsightBody {
    Summary(TicketSummary),
    RefundExplanation(RefundExplanation),
    KnowledgeBase(Vec<KnowledgeArticle>),
}

impl InsightBody {
    pub fn kind(&self) -> InsightKind {
        match self {
            Self::Summary(_) => InsightKind::Summary,
            Self::RefundExplanation(_) => InsightKind::RefundExplanation,
            Self::KnowledgeBase(_) => InsightKind::KnowledgeBase,
        }
    }

    /// Whether the backend served this payload from its own cache.
    /// Always false for fallbacks and knowledge-base results.
    pub fn cached(&self) -> bool {
        match self {
            Self::Summary(summary) => summary.cached,
            Self::RefundExplanation(explanation) => explanation.cached,
            Self::KnowledgeBase(_) => false,
        }
    }
}

/// A fetched insight with its cache bookkeeping.
///
/// `generation` distinguishes successive fetch attempts for the same key;
/// out-of-order completions are resolved by comparing generations, never
/// wall-clock arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub key: InsightKey,
    pub generation: u64,
    pub body: InsightBody,
}

/// A suggested agent response for a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSuggestion {
    pub id: String,
    pub content: String,
    pub confidence: f32,
}

/// Agent feedback on a response suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionFeedback {
    /// Rating from 1 to 5
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
