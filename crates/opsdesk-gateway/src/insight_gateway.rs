//! HTTP implementation of the insight gateway.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

use opsdesk_core::error::Result;
use opsdesk_core::gateway::InsightGateway;
use opsdesk_core::insight::{
    KnowledgeArticle, RefundExplanation, ResponseSuggestion, SuggestionFeedback, TicketSummary,
};

use crate::config::{GatewayConfig, check_status, decode_error, transport_error};
use crate::dto::{
    ArticleDto, CategoriesDto, ExplanationDto, FeedbackBody, SearchResponseDto, SuggestionDto,
    SuggestionsDto, SummaryDto,
};

/// Insight gateway speaking the support backend's AI endpoints.
#[derive(Clone)]
pub struct HttpInsightGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpInsightGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl InsightGateway for HttpInsightGateway {
    async fn summary(&self, ticket_id: &str, regenerate: bool) -> Result<TicketSummary> {
        let url = self.config.url(&format!("/api/ai/tickets/{ticket_id}/summary"));
        let mut request = self.authorize(self.client.get(url));
        if regenerate {
            request = request.query(&[("regenerate", "true")]);
        }
        let response = request.send().await.map_err(transport_error)?;
        let dto: SummaryDto = check_status(response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;
        Ok(dto.into_domain())
    }

    async fn refund_explanation(&self, refund_id: &str) -> Result<RefundExplanation> {
        let url = self
            .config
            .url(&format!("/api/ai/refunds/{refund_id}/explanation"));
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        let dto: ExplanationDto = check_status(response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;
        Ok(dto.into_domain())
    }

    async fn search_knowledge_base(
        &self,
        query: &str,
        category: Option<&str>,
    ) -> Result<Vec<KnowledgeArticle>> {
        let url = self.config.url("/api/ai/knowledge-base/search");
        let mut request = self
            .authorize(self.client.get(url))
            .query(&[("query", query)]);
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        let response = request.send().await.map_err(transport_error)?;
        let dto: SearchResponseDto = check_status(response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;
        Ok(dto.results.into_iter().map(ArticleDto::into_domain).collect())
    }

    async fn knowledge_categories(&self) -> Result<Vec<String>> {
        let url = self.config.url("/api/ai/knowledge-base/categories");
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        let dto: CategoriesDto = check_status(response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;
        Ok(dto.categories)
    }

    async fn response_suggestions(&self, ticket_id: &str) -> Result<Vec<ResponseSuggestion>> {
        let url = self
            .config
            .url(&format!("/api/ai/tickets/{ticket_id}/suggestions"));
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        let dto: SuggestionsDto = check_status(response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;
        Ok(dto
            .suggestions
            .into_iter()
            .map(SuggestionDto::into_domain)
            .collect())
    }

    async fn submit_suggestion_feedback(
        &self,
        suggestion_id: &str,
        feedback: &SuggestionFeedback,
    ) -> Result<()> {
        let url = self
            .config
            .url(&format!("/api/ai/suggestions/{suggestion_id}/feedback"));
        let response = self
            .authorize(self.client.post(url))
            .json(&FeedbackBody {
                rating: feedback.rating,
                comment: feedback.comment.as_deref(),
            })
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }
}
