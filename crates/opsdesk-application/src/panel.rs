//! Assistance panel composition root.
//!
//! Binds the ticket workflow, the insight cache, the substitution engine,
//! the debounced knowledge search, and template management into the one
//! object a console frontend drives. No rendering happens here; the panel
//! only owns orchestration state (selected ticket, composer text,
//! insight snapshots).

use std::sync::Arc;

use tokio::sync::RwLock;

use opsdesk_core::error::{OpsdeskError, Result};
use opsdesk_core::gateway::{InsightGateway, TicketGateway};
use opsdesk_core::insight::{InsightKey, InsightKind, ResponseSuggestion, SuggestionFeedback};
use opsdesk_core::store::KeyValueStore;
use opsdesk_core::template::{self, MessageTemplate, TemplateContext};
use opsdesk_core::ticket::{Message, MessageDraft, Ticket};

use crate::insight_cache::{InsightCache, InsightRequest, InsightSnapshot};
use crate::search::KnowledgeSearch;
use crate::templates::{ActivityKind, TemplateService};
use crate::workflow::TicketWorkflow;

/// The console's right-hand panel and chat composer, minus the pixels.
pub struct AssistancePanel {
    workflow: TicketWorkflow,
    insights: InsightCache,
    search: KnowledgeSearch,
    templates: TemplateService,
    insight_gateway: Arc<dyn InsightGateway>,
    composer: RwLock<String>,
}

impl AssistancePanel {
    pub fn new(
        ticket_gateway: Arc<dyn TicketGateway>,
        insight_gateway: Arc<dyn InsightGateway>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            workflow: TicketWorkflow::new(ticket_gateway),
            insights: InsightCache::new(insight_gateway.clone()),
            search: KnowledgeSearch::new(insight_gateway.clone()),
            templates: TemplateService::new(store),
            insight_gateway,
            composer: RwLock::new(String::new()),
        }
    }

    /// Selects a ticket and prefetches its insights.
    ///
    /// The summary is always fetched; the refund explanation only when a
    /// related order exists. Both degrade to fallbacks on failure, so
    /// selection itself only fails when the ticket cannot be loaded.
    pub async fn select_ticket(&self, ticket_id: &str) -> Result<Ticket> {
        let ticket = self.workflow.select(ticket_id).await?;
        self.composer.write().await.clear();

        let mut requests = vec![InsightRequest::summary(&ticket.id)];
        if let Some(order) = &ticket.order {
            requests.push(InsightRequest::refund_explanation(&order.id));
        }
        futures::future::join_all(
            requests
                .iter()
                .map(|request| self.insights.fetch(request, false)),
        )
        .await;

        if let Err(err) = self
            .templates
            .record_activity(ActivityKind::TicketOpened, &ticket.id)
            .await
        {
            // Activity is a convenience list; losing an entry must not
            // fail selection.
            tracing::warn!(error = %err, "failed to record ticket activity");
        }

        Ok(ticket)
    }

    /// The guarded-action workflow for the selected ticket.
    pub fn workflow(&self) -> &TicketWorkflow {
        &self.workflow
    }

    /// The debounced knowledge-base search.
    pub fn search(&self) -> &KnowledgeSearch {
        &self.search
    }

    /// Template management.
    pub fn templates(&self) -> &TemplateService {
        &self.templates
    }

    /// Current summary snapshot for the selected ticket.
    pub async fn summary(&self) -> Result<InsightSnapshot> {
        let ticket = self.selected().await?;
        Ok(self
            .insights
            .peek(&InsightKey::new(ticket.id, InsightKind::Summary))
            .await)
    }

    /// Asks the backend for a fresh summary, bypassing both caches.
    pub async fn regenerate_summary(&self) -> Result<InsightSnapshot> {
        let ticket = self.selected().await?;
        Ok(self
            .insights
            .fetch(&InsightRequest::summary(&ticket.id), true)
            .await)
    }

    /// Current refund-explanation snapshot, when the ticket has an order.
    pub async fn refund_explanation(&self) -> Result<InsightSnapshot> {
        let ticket = self.selected().await?;
        let order = ticket
            .order
            .ok_or_else(|| OpsdeskError::invalid_action("ticket has no related order"))?;
        Ok(self
            .insights
            .peek(&InsightKey::new(order.id, InsightKind::RefundExplanation))
            .await)
    }

    /// Composer text as currently drafted.
    pub async fn composer_text(&self) -> String {
        self.composer.read().await.clone()
    }

    pub async fn set_composer_text(&self, text: impl Into<String>) {
        *self.composer.write().await = text.into();
    }

    /// Resolves a template against the selected ticket's context and
    /// appends it to the composer.
    pub async fn insert_template(&self, template: &MessageTemplate) -> Result<String> {
        let ctx = self.template_context().await?;
        let resolved = template::resolve(&template.content, &ctx);
        let mut composer = self.composer.write().await;
        composer.push_str(&resolved);
        Ok(composer.clone())
    }

    /// The substitution context derived from the selected ticket.
    pub async fn template_context(&self) -> Result<TemplateContext> {
        let ticket = self.selected().await?;
        Ok(TemplateContext {
            order_id: ticket.order.map(|o| o.id),
            customer_name: ticket.customer_name,
            ticket_id: Some(ticket.id),
        })
    }

    /// Sends the composer content as an agent message. The composer is
    /// cleared only after the gateway accepts the message, so a failed
    /// send loses nothing.
    pub async fn send_message(&self, is_internal: bool) -> Result<Message> {
        let content = self.composer.read().await.clone();
        if content.trim().is_empty() {
            return Err(OpsdeskError::invalid_action("composer is empty"));
        }

        let draft = MessageDraft::new(content, is_internal);
        let message = self.workflow.add_message(&draft).await?;
        self.composer.write().await.clear();

        if let Ok(ticket) = self.selected().await {
            if let Err(err) = self
                .templates
                .record_activity(ActivityKind::MessageSent, &ticket.id)
                .await
            {
                tracing::warn!(error = %err, "failed to record message activity");
            }
        }
        Ok(message)
    }

    /// Suggested responses for the selected ticket. Not cached: the
    /// endpoint has no regeneration protocol.
    pub async fn response_suggestions(&self) -> Result<Vec<ResponseSuggestion>> {
        let ticket = self.selected().await?;
        self.insight_gateway.response_suggestions(&ticket.id).await
    }

    /// Passes agent feedback on a suggestion through to the backend.
    pub async fn submit_suggestion_feedback(
        &self,
        suggestion_id: &str,
        feedback: &SuggestionFeedback,
    ) -> Result<()> {
        self.insight_gateway
            .submit_suggestion_feedback(suggestion_id, feedback)
            .await
    }

    /// Knowledge-base categories for the search filter dropdown.
    pub async fn knowledge_categories(&self) -> Result<Vec<String>> {
        self.insight_gateway.knowledge_categories().await
    }

    async fn selected(&self) -> Result<Ticket> {
        self.workflow
            .current()
            .await
            .ok_or_else(|| OpsdeskError::invalid_action("no ticket selected"))
    }
}
