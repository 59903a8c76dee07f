//! HTTP implementation of the ticket gateway.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

use opsdesk_core::error::Result;
use opsdesk_core::gateway::TicketGateway;
use opsdesk_core::ticket::{
    Message, MessageDraft, RefundApproval, Ticket, TicketFilter, TicketStatus,
};

use crate::config::{GatewayConfig, check_status, decode_error, transport_error};
use crate::dto::{
    AddMessageBody, ApproveRefundBody, MessageDto, RejectRefundBody, TicketDto, UpdateStatusBody,
};

/// Ticket gateway speaking the support backend's REST API.
#[derive(Clone)]
pub struct HttpTicketGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpTicketGateway {
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
impl TicketGateway for HttpTicketGateway {
    async fn get_ticket(&self, id: &str) -> Result<Ticket> {
        let url = self.config.url(&format!("/api/tickets/{id}"));
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        let dto: TicketDto = check_status(response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;
        Ok(dto.into_domain())
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let url = self.config.url("/api/tickets");
        let mut request = self.authorize(self.client.get(url));
        if let Some(status) = filter.status {
            request = request.query(&[("status", status.to_string())]);
        }
        if let Some(priority) = filter.priority {
            request = request.query(&[("priority", priority.to_string())]);
        }
        if filter.assigned_only {
            request = request.query(&[("assignedOnly", "true")]);
        }

        let response = request.send().await.map_err(transport_error)?;
        let dtos: Vec<TicketDto> = check_status(response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;
        Ok(dtos.into_iter().map(TicketDto::into_domain).collect())
    }

    async fn update_status(&self, id: &str, status: TicketStatus) -> Result<()> {
        let url = self.config.url(&format!("/api/tickets/{id}/status"));
        let response = self
            .authorize(self.client.patch(url))
            .json(&UpdateStatusBody { status })
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn resolve(&self, id: &str) -> Result<()> {
        let url = self.config.url(&format!("/api/tickets/{id}/resolve"));
        let response = self
            .authorize(self.client.post(url))
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn add_message(&self, id: &str, draft: &MessageDraft) -> Result<Message> {
        let url = self.config.url(&format!("/api/tickets/{id}/messages"));
        let response = self
            .authorize(self.client.post(url))
            .json(&AddMessageBody {
                content: &draft.content,
                is_internal: draft.is_internal,
            })
            .send()
            .await
            .map_err(transport_error)?;
        let dto: MessageDto = check_status(response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;
        Ok(dto.into_domain())
    }

    async fn delete_message(&self, id: &str, message_id: &str) -> Result<()> {
        let url = self
            .config
            .url(&format!("/api/tickets/{id}/messages/{message_id}"));
        let response = self
            .authorize(self.client.delete(url))
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn approve_refund(&self, id: &str, approval: &RefundApproval) -> Result<()> {
        let url = self.config.url(&format!("/api/tickets/{id}/refund/approve"));
        tracing::info!(ticket_id = %id, order_id = %approval.order_id, "approving refund");
        let response = self
            .authorize(self.client.post(url))
            .json(&ApproveRefundBody {
                order_id: &approval.order_id,
                amount: approval.amount,
                reason: &approval.reason,
            })
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn reject_refund(&self, id: &str, reason: &str) -> Result<()> {
        let url = self.config.url(&format!("/api/tickets/{id}/refund/reject"));
        let response = self
            .authorize(self.client.post(url))
            .json(&RejectRefundBody { reason })
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }
}
