//! Ticket domain model.
//!
//! This module contains the Ticket entity and its message sequence as the
//! console sees them. Tickets are created server-side; the console never
//! mutates status directly, only through guarded workflow actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Status of a ticket in the support workflow.
///
/// Transitions are monotonic except for the single explicit reopen
/// (Resolved back to InProgress).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

/// Priority assigned by the backend triage pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SenderType {
    Agent,
    Customer,
}

/// Image extensions recognized by [`Message::image_attachments`].
const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// A single message in a ticket's conversation.
///
/// Messages are immutable once created; the sequence is append-only and
/// owned by the ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    pub id: String,
    /// Message body. May be a comma-separated list of image filenames,
    /// which the console renders as attachments instead of text.
    pub content: String,
    /// Who sent the message
    pub sender: SenderType,
    /// Internal notes are visible to agents only
    #[serde(default)]
    pub is_internal: bool,
    /// Timestamp when the message was created
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Interprets the content as image attachments when every
    /// comma-separated item looks like an image filename.
    ///
    /// Returns `None` when the content is ordinary text.
    pub fn image_attachments(&self) -> Option<Vec<&str>> {
        let items: Vec<&str> = self
            .content
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect();

        if items.is_empty() {
            return None;
        }

        let all_images = items.iter().all(|item| {
            let lower = item.to_lowercase();
            IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        });

        if all_images { Some(items) } else { None }
    }
}

/// An order related to a ticket, shown next to the refund controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Externally assigned order identifier
    pub id: String,
    /// Order total
    pub amount: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// When the order was placed
    pub placed_at: DateTime<Utc>,
}

/// A support ticket as seen by the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Stable, externally assigned identifier
    pub id: String,
    /// Short human-readable subject line
    pub subject: String,
    /// Current workflow status
    pub status: TicketStatus,
    /// Triage priority
    pub priority: TicketPriority,
    /// Customer display name, when the backend knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Ordered, append-only message sequence
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Related order, when one exists. Refund approval is only legal
    /// when this is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    /// Timestamp when the ticket was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the ticket was last updated
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Finds a message by id.
    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    /// Returns true when the ticket has a related order.
    pub fn has_order(&self) -> bool {
        self.order.is_some()
    }
}

/// A draft message to be appended to a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub content: String,
    #[serde(default)]
    pub is_internal: bool,
}

impl MessageDraft {
    pub fn new(content: impl Into<String>, is_internal: bool) -> Self {
        Self {
            content: content.into(),
            is_internal,
        }
    }
}

/// Payload committed by a confirmed refund approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundApproval {
    pub order_id: String,
    pub amount: f64,
    pub reason: String,
}

/// Filter for listing tickets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TicketPriority>,
    /// Restrict the listing to tickets assigned to the calling agent
    #[serde(default)]
    pub assigned_only: bool,
}
