//! Remote gateway capability traits.
//!
//! These traits are the console's only view of the backend. The wire
//! format, request signing, and session teardown on 401 belong to the
//! implementations; callers see only the error taxonomy in
//! [`crate::error::OpsdeskError`].

use async_trait::async_trait;

use crate::error::Result;
use crate::insight::{
    KnowledgeArticle, RefundExplanation, ResponseSuggestion, SuggestionFeedback, TicketSummary,
};
use crate::ticket::{Message, MessageDraft, RefundApproval, Ticket, TicketFilter, TicketStatus};

/// Remote capability for reading and mutating tickets.
#[async_trait]
pub trait TicketGateway: Send + Sync {
    /// Fetches a single ticket with its full message sequence.
    async fn get_ticket(&self, id: &str) -> Result<Ticket>;

    /// Lists tickets matching the filter.
    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>>;

    /// Sets the ticket status directly. Used by the reopen action.
    async fn update_status(&self, id: &str, status: TicketStatus) -> Result<()>;

    /// Marks the ticket resolved.
    async fn resolve(&self, id: &str) -> Result<()>;

    /// Appends a message and returns it as created by the backend.
    async fn add_message(&self, id: &str, draft: &MessageDraft) -> Result<Message>;

    /// Deletes a message. Callers re-fetch the ticket afterwards to keep
    /// message ordering authoritative.
    async fn delete_message(&self, id: &str, message_id: &str) -> Result<()>;

    /// Commits a refund approval.
    async fn approve_refund(&self, id: &str, approval: &RefundApproval) -> Result<()>;

    /// Commits a refund rejection with a reason.
    async fn reject_refund(&self, id: &str, reason: &str) -> Result<()>;
}

/// Remote capability for AI-generated insights.
#[async_trait]
pub trait InsightGateway: Send + Sync {
    /// Fetches the conversation summary for a ticket. With `regenerate`
    /// the backend is asked to produce a fresh one instead of serving its
    /// cache.
    async fn summary(&self, ticket_id: &str, regenerate: bool) -> Result<TicketSummary>;

    /// Fetches the refund/fraud explanation for a refund id.
    async fn refund_explanation(&self, refund_id: &str) -> Result<RefundExplanation>;

    /// Searches the knowledge base.
    async fn search_knowledge_base(
        &self,
        query: &str,
        category: Option<&str>,
    ) -> Result<Vec<KnowledgeArticle>>;

    /// Lists the knowledge-base categories available for filtering.
    async fn knowledge_categories(&self) -> Result<Vec<String>>;

    /// Fetches suggested responses for a ticket.
    async fn response_suggestions(&self, ticket_id: &str) -> Result<Vec<ResponseSuggestion>>;

    /// Submits agent feedback on a suggestion.
    async fn submit_suggestion_feedback(
        &self,
        suggestion_id: &str,
        feedback: &SuggestionFeedback,
    ) -> Result<()>;
}
