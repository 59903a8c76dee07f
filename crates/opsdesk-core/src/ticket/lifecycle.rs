//! Ticket lifecycle transition rules.
//!
//! The legality of every guarded action is decided here, synchronously and
//! without any gateway involvement, so the rules stay testable on their own.
//! The async commit protocol around these rules lives in the application
//! layer.

use serde::{Deserialize, Serialize};
use strum::Display;

use super::model::{Ticket, TicketStatus};
use crate::error::{OpsdeskError, Result};

/// Discriminant for a guarded action, used for confirmation dialogs and
/// activity records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GuardedActionKind {
    ApproveRefund,
    RejectRefund,
    Resolve,
    Reopen,
    DeleteMessage,
}

/// A state-mutating operation that requires explicit confirmation before
/// any network effect occurs.
///
/// The first four are lifecycle actions; `DeleteMessage` is guarded the
/// same way but does not touch ticket status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuardedAction {
    ApproveRefund {
        order_id: String,
        amount: f64,
        reason: String,
    },
    RejectRefund {
        reason: String,
    },
    Resolve,
    Reopen,
    DeleteMessage {
        message_id: String,
    },
}

impl GuardedAction {
    pub fn kind(&self) -> GuardedActionKind {
        match self {
            Self::ApproveRefund { .. } => GuardedActionKind::ApproveRefund,
            Self::RejectRefund { .. } => GuardedActionKind::RejectRefund,
            Self::Resolve => GuardedActionKind::Resolve,
            Self::Reopen => GuardedActionKind::Reopen,
            Self::DeleteMessage { .. } => GuardedActionKind::DeleteMessage,
        }
    }

    /// Checks whether this action is legal for the given ticket.
    ///
    /// Returns an `InvalidAction` error naming the violated guard, so the
    /// caller can surface it directly.
    pub fn check(&self, ticket: &Ticket) -> Result<()> {
        match self {
            Self::ApproveRefund { .. } => {
                if ticket.order.is_none() {
                    return Err(OpsdeskError::invalid_action(
                        "refund approval requires a related order",
                    ));
                }
                Ok(())
            }
            // A rejection carries its reason to the backend regardless of
            // order presence.
            Self::RejectRefund { .. } => Ok(()),
            Self::Resolve => match ticket.status {
                TicketStatus::Open | TicketStatus::InProgress => Ok(()),
                TicketStatus::Resolved => Err(OpsdeskError::invalid_action(
                    "ticket is already resolved",
                )),
            },
            Self::Reopen => match ticket.status {
                TicketStatus::Resolved => Ok(()),
                TicketStatus::Open | TicketStatus::InProgress => Err(
                    OpsdeskError::invalid_action("only resolved tickets can be reopened"),
                ),
            },
            Self::DeleteMessage { message_id } => {
                if ticket.message(message_id).is_none() {
                    return Err(OpsdeskError::not_found("message", message_id.clone()));
                }
                Ok(())
            }
        }
    }

    /// The status the ticket moves to after a successful commit, if the
    /// action changes status at all.
    pub fn target_status(&self) -> Option<TicketStatus> {
        match self {
            Self::ApproveRefund { .. } | Self::RejectRefund { .. } | Self::Resolve => {
                Some(TicketStatus::Resolved)
            }
            Self::Reopen => Some(TicketStatus::InProgress),
            Self::DeleteMessage { .. } => None,
        }
    }
}

/// Whether a direct status transition is allowed.
///
/// Forward moves only, with the single backward edge Resolved -> InProgress.
pub fn can_transition(from: TicketStatus, to: TicketStatus) -> bool {
    use TicketStatus::*;
    match (from, to) {
        (Open, InProgress) | (Open, Resolved) | (InProgress, Resolved) => true,
        // The sole backward transition: reopen.
        (Resolved, InProgress) => true,
        _ => false,
    }
}

/// An ephemeral confirmation for a guarded action.
///
/// Created when the action is initiated, destroyed on confirm or cancel.
/// No network call happens until the request is confirmed. At most one
/// request is outstanding per workflow; they are never queued.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationRequest {
    pub kind: GuardedActionKind,
    /// Dialog title, e.g. "Approve refund"
    pub title: String,
    /// Human-readable description of what a confirm will commit
    pub message: String,
    /// The operation committed on confirm
    pub action: GuardedAction,
}

impl ConfirmationRequest {
    /// Builds the confirmation for an action against a ticket.
    ///
    /// Does not validate legality; call [`GuardedAction::check`] first.
    pub fn for_action(action: GuardedAction, ticket: &Ticket) -> Self {
        let (title, message) = match &action {
            GuardedAction::ApproveRefund { order_id, amount, .. } => (
                "Approve refund".to_string(),
                format!(
                    "Approve a refund of {amount:.2} for order {order_id} on ticket {}?",
                    ticket.id
                ),
            ),
            GuardedAction::RejectRefund { reason } => (
                "Reject refund".to_string(),
                format!("Reject the refund request on ticket {}? Reason: {reason}", ticket.id),
            ),
            GuardedAction::Resolve => (
                "Resolve ticket".to_string(),
                format!("Mark ticket {} as resolved?", ticket.id),
            ),
            GuardedAction::Reopen => (
                "Reopen ticket".to_string(),
                format!("Reopen ticket {} and move it back to in progress?", ticket.id),
            ),
            GuardedAction::DeleteMessage { message_id } => (
                "Delete message".to_string(),
                format!("Delete message {message_id} from ticket {}?", ticket.id),
            ),
        };

        Self {
            kind: action.kind(),
            title,
            message,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::model::{Order, TicketPriority};
    use chrono::Utc;

    fn ticket(status: TicketStatus, with_order: bool) -> Ticket {
        Ticket {
            id: "T-1".to_string(),
            subject: "Broken widget".to_string(),
            status,
            priority: TicketPriority::High,
            customer_name: Some("Jane Doe".to_string()),
            messages: Vec::new(),
            order: with_order.then(|| Order {
                id: "O123".to_string(),
                amount: 42.50,
                currency: "USD".to_string(),
                placed_at: Utc::now(),
            }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_approve_refund_requires_order() {
        let action = GuardedAction::ApproveRefund {
            order_id: "O123".to_string(),
            amount: 42.50,
            reason: "damaged".to_string(),
        };
        assert!(action.check(&ticket(TicketStatus::Open, true)).is_ok());

        let err = action.check(&ticket(TicketStatus::Open, false)).unwrap_err();
        assert!(matches!(err, OpsdeskError::InvalidAction(_)));
    }

    #[test]
    fn test_reject_refund_legal_without_order() {
        let action = GuardedAction::RejectRefund {
            reason: "outside return window".to_string(),
        };
        assert!(action.check(&ticket(TicketStatus::Open, false)).is_ok());
    }

    #[test]
    fn test_resolve_only_from_open_or_in_progress() {
        assert!(GuardedAction::Resolve.check(&ticket(TicketStatus::Open, false)).is_ok());
        assert!(
            GuardedAction::Resolve
                .check(&ticket(TicketStatus::InProgress, false))
                .is_ok()
        );
        assert!(
            GuardedAction::Resolve
                .check(&ticket(TicketStatus::Resolved, false))
                .is_err()
        );
    }

    #[test]
    fn test_reopen_only_from_resolved() {
        assert!(GuardedAction::Reopen.check(&ticket(TicketStatus::Resolved, false)).is_ok());
        assert!(GuardedAction::Reopen.check(&ticket(TicketStatus::Open, false)).is_err());
        assert!(
            GuardedAction::Reopen
                .check(&ticket(TicketStatus::InProgress, false))
                .is_err()
        );
    }

    #[test]
    fn test_delete_message_requires_existing_message() {
        let action = GuardedAction::DeleteMessage {
            message_id: "m-404".to_string(),
        };
        let err = action.check(&ticket(TicketStatus::Open, false)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_transition_matrix() {
        use TicketStatus::*;
        assert!(can_transition(Open, InProgress));
        assert!(can_transition(Open, Resolved));
        assert!(can_transition(InProgress, Resolved));
        assert!(can_transition(Resolved, InProgress));

        assert!(!can_transition(Resolved, Open));
        assert!(!can_transition(InProgress, Open));
        assert!(!can_transition(Open, Open));
    }

    #[test]
    fn test_target_status() {
        assert_eq!(
            GuardedAction::Resolve.target_status(),
            Some(TicketStatus::Resolved)
        );
        assert_eq!(
            GuardedAction::Reopen.target_status(),
            Some(TicketStatus::InProgress)
        );
        assert_eq!(
            GuardedAction::DeleteMessage {
                message_id: "m1".to_string()
            }
            .target_status(),
            None
        );
    }

    #[test]
    fn test_confirmation_request_carries_action() {
        let t = ticket(TicketStatus::Open, true);
        let request = ConfirmationRequest::for_action(
            GuardedAction::ApproveRefund {
                order_id: "O123".to_string(),
                amount: 42.50,
                reason: "damaged".to_string(),
            },
            &t,
        );
        assert_eq!(request.kind, GuardedActionKind::ApproveRefund);
        assert!(request.message.contains("O123"));
        assert!(request.message.contains("T-1"));
    }
}
