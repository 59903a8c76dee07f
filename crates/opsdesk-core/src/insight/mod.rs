//! AI insight domain: the closed insight union and related payloads.

pub mod model;

pub use model::{
    Insight, InsightBody, InsightKey, InsightKind, KnowledgeArticle, RefundExplanation,
    ResponseSuggestion, SuggestionFeedback, TicketSummary, Urgency,
};
