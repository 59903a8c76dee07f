//! Response template domain models.

use serde::{Deserialize, Serialize};

/// A canned response template an agent can insert into the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplate {
    /// Unique template identifier. Assigned on first save when empty.
    #[serde(default)]
    pub id: String,
    /// Short name shown in the template picker
    pub title: String,
    /// Template body, may contain `{{...}}` placeholders
    pub content: String,
    /// Optional grouping category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl MessageTemplate {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            content: content.into(),
            category: None,
        }
    }
}

/// Ephemeral substitution context derived from the currently selected
/// ticket.
///
/// Any field may be absent; an absent field leaves its placeholder
/// unresolved, which is a visible signal to the agent rather than an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
}

impl TemplateContext {
    /// Context with all fields present.
    pub fn new(
        order_id: impl Into<String>,
        customer_name: impl Into<String>,
        ticket_id: impl Into<String>,
    ) -> Self {
        Self {
            order_id: Some(order_id.into()),
            customer_name: Some(customer_name.into()),
            ticket_id: Some(ticket_id.into()),
        }
    }
}
