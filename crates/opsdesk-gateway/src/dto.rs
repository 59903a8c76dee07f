//! Wire DTOs for the support backend.
//!
//! The backend speaks camelCase JSON; these types absorb that convention
//! at the boundary and convert into the snake_case domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use opsdesk_core::insight::{
    KnowledgeArticle, RefundExplanation, ResponseSuggestion, TicketSummary, Urgency,
};
use opsdesk_core::ticket::{
    Message, Order, SenderType, Ticket, TicketPriority, TicketStatus,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub content: String,
    pub sender_type: SenderType,
    #[serde(default)]
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

impl MessageDto {
    pub fn into_domain(self) -> Message {
        Message {
            id: self.id,
            content: self.content,
            sender: self.sender_type,
            is_internal: self.is_internal,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    pub amount: f64,
    pub currency: String,
    pub placed_at: DateTime<Utc>,
}

impl OrderDto {
    pub fn into_domain(self) -> Order {
        Order {
            id: self.id,
            amount: self.amount,
            currency: self.currency,
            placed_at: self.placed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDto {
    pub id: String,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub messages: Vec<MessageDto>,
    #[serde(default)]
    pub related_order: Option<OrderDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketDto {
    pub fn into_domain(self) -> Ticket {
        Ticket {
            id: self.id,
            subject: self.subject,
            status: self.status,
            priority: self.priority,
            customer_name: self.customer_name,
            messages: self.messages.into_iter().map(MessageDto::into_domain).collect(),
            order: self.related_order.map(OrderDto::into_domain),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDto {
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub confidence: f32,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub cached: bool,
}

impl SummaryDto {
    pub fn into_domain(self) -> TicketSummary {
        TicketSummary {
            summary: self.summary,
            key_points: self.key_points,
            confidence: self.confidence,
            urgency: self.urgency,
            cached: self.cached,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationDto {
    pub recommendation: String,
    pub explanation: String,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    pub confidence: f32,
    #[serde(default)]
    pub cached: bool,
}

impl ExplanationDto {
    pub fn into_domain(self) -> RefundExplanation {
        RefundExplanation {
            recommendation: self.recommendation,
            explanation: self.explanation,
            risk_factors: self.risk_factors,
            confidence: self.confidence,
            cached: self.cached,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    #[serde(default)]
    pub category: Option<String>,
    pub score: f32,
}

impl ArticleDto {
    pub fn into_domain(self) -> KnowledgeArticle {
        KnowledgeArticle {
            id: self.id,
            title: self.title,
            excerpt: self.excerpt,
            category: self.category,
            score: self.score,
        }
    }
}

/// Search results arrive wrapped in an envelope object.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponseDto {
    #[serde(default)]
    pub results: Vec<ArticleDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesDto {
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionDto {
    pub id: String,
    pub content: String,
    pub confidence: f32,
}

impl SuggestionDto {
    pub fn into_domain(self) -> ResponseSuggestion {
        ResponseSuggestion {
            id: self.id,
            content: self.content,
            confidence: self.confidence,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsDto {
    #[serde(default)]
    pub suggestions: Vec<SuggestionDto>,
}

// Request bodies.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusBody {
    pub status: TicketStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMessageBody<'a> {
    pub content: &'a str,
    pub is_internal: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRefundBody<'a> {
    pub order_id: &'a str,
    pub amount: f64,
    pub reason: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRefundBody<'a> {
    pub reason: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackBody<'a> {
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_dto_maps_wire_json() {
        let json = r#"{
            "id": "T-1",
            "subject": "Refund for damaged item",
            "status": "IN_PROGRESS",
            "priority": "high",
            "customerName": "Jane Doe",
            "messages": [
                {
                    "id": "m1",
                    "content": "receipt.png,box.jpg",
                    "senderType": "customer",
                    "createdAt": "2026-05-01T10:00:00Z"
                }
            ],
            "relatedOrder": {
                "id": "O123",
                "amount": 42.5,
                "currency": "USD",
                "placedAt": "2026-04-20T09:30:00Z"
            },
            "createdAt": "2026-05-01T10:00:00Z",
            "updatedAt": "2026-05-02T08:15:00Z"
        }"#;

        let ticket = serde_json::from_str::<TicketDto>(json).unwrap().into_domain();
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.priority, TicketPriority::High);
        assert_eq!(ticket.customer_name.as_deref(), Some("Jane Doe"));
        assert_eq!(ticket.order.as_ref().unwrap().id, "O123");
        assert!(ticket.messages[0].image_attachments().is_some());
    }

    #[test]
    fn test_summary_dto_defaults() {
        let json = r#"{"summary": "Customer wants a refund.", "confidence": 0.92}"#;
        let summary = serde_json::from_str::<SummaryDto>(json).unwrap().into_domain();
        assert!(summary.key_points.is_empty());
        assert_eq!(summary.urgency, Urgency::Low);
        assert!(!summary.cached);
    }

    #[test]
    fn test_request_bodies_use_camel_case() {
        let body = ApproveRefundBody {
            order_id: "O123",
            amount: 42.5,
            reason: "damaged",
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"orderId\":\"O123\""));

        let body = AddMessageBody {
            content: "hello",
            is_internal: true,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"isInternal\":true"));
    }
}
