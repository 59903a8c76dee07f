//! Guarded ticket workflow.
//!
//! Every state-mutating action follows the same two-phase protocol:
//! initiation validates legality and produces a [`ConfirmationRequest`]
//! with no network effect; only an explicit confirm runs the gateway call
//! and, on success, the optimistic local transition. A gateway failure
//! leaves local state untouched and surfaces the error, so the workflow
//! fails closed and the action can be initiated again.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use opsdesk_core::error::{OpsdeskError, Result};
use opsdesk_core::gateway::TicketGateway;
use opsdesk_core::ticket::{
    ConfirmationRequest, GuardedAction, Message, MessageDraft, RefundApproval, Ticket,
    TicketStatus,
};

/// Holds the selected ticket and drives its guarded actions.
pub struct TicketWorkflow {
    gateway: Arc<dyn TicketGateway>,
    ticket: RwLock<Option<Ticket>>,
    pending: Mutex<Option<ConfirmationRequest>>,
}

impl TicketWorkflow {
    pub fn new(gateway: Arc<dyn TicketGateway>) -> Self {
        Self {
            gateway,
            ticket: RwLock::new(None),
            pending: Mutex::new(None),
        }
    }

    /// Loads a ticket from the gateway and makes it the selected one.
    /// Any outstanding confirmation is discarded.
    pub async fn select(&self, ticket_id: &str) -> Result<Ticket> {
        let ticket = self.gateway.get_ticket(ticket_id).await?;
        *self.pending.lock().await = None;
        *self.ticket.write().await = Some(ticket.clone());
        tracing::info!(ticket_id = %ticket.id, status = %ticket.status, "ticket selected");
        Ok(ticket)
    }

    /// Re-fetches the selected ticket, replacing local state wholesale.
    ///
    /// The optimistic transitions this workflow applies can drift from the
    /// backend when it runs side effects of its own; hosts call this to
    /// re-sync.
    pub async fn refresh(&self) -> Result<Ticket> {
        let id = self.selected_id().await?;
        let ticket = self.gateway.get_ticket(&id).await?;
        *self.ticket.write().await = Some(ticket.clone());
        Ok(ticket)
    }

    /// The currently selected ticket, if any.
    pub async fn current(&self) -> Option<Ticket> {
        self.ticket.read().await.clone()
    }

    /// The outstanding confirmation, if any.
    pub async fn pending(&self) -> Option<ConfirmationRequest> {
        self.pending.lock().await.clone()
    }

    /// Initiates a guarded action: validates legality against the selected
    /// ticket and produces the confirmation to show the agent. No network
    /// call happens here.
    ///
    /// At most one confirmation is outstanding; initiating a new action
    /// replaces a previous, unconfirmed one.
    pub async fn request(&self, action: GuardedAction) -> Result<ConfirmationRequest> {
        let ticket = self.selected_ticket().await?;
        action.check(&ticket)?;
        let request = ConfirmationRequest::for_action(action, &ticket);

        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.take() {
            tracing::debug!(kind = %previous.kind, "replacing unconfirmed request");
        }
        *pending = Some(request.clone());
        Ok(request)
    }

    /// Discards the outstanding confirmation with zero side effects.
    pub async fn cancel(&self) {
        if let Some(request) = self.pending.lock().await.take() {
            tracing::debug!(kind = %request.kind, "confirmation cancelled");
        }
    }

    /// Commits the outstanding confirmation.
    ///
    /// The request is consumed whether the commit succeeds or fails; a
    /// failed action is retried by initiating it again. On success the
    /// local status transition is applied immediately, without a
    /// follow-up re-fetch.
    pub async fn confirm(&self) -> Result<()> {
        let request = self
            .pending
            .lock()
            .await
            .take()
            .ok_or_else(|| OpsdeskError::invalid_action("no confirmation outstanding"))?;

        let ticket_id = self.selected_id().await?;

        match &request.action {
            GuardedAction::ApproveRefund {
                order_id,
                amount,
                reason,
            } => {
                let approval = RefundApproval {
                    order_id: order_id.clone(),
                    amount: *amount,
                    reason: reason.clone(),
                };
                self.gateway.approve_refund(&ticket_id, &approval).await?;
            }
            GuardedAction::RejectRefund { reason } => {
                self.gateway.reject_refund(&ticket_id, reason).await?;
            }
            GuardedAction::Resolve => {
                self.gateway.resolve(&ticket_id).await?;
            }
            GuardedAction::Reopen => {
                self.gateway
                    .update_status(&ticket_id, TicketStatus::InProgress)
                    .await?;
            }
            GuardedAction::DeleteMessage { message_id } => {
                self.gateway.delete_message(&ticket_id, message_id).await?;
                // Deletion re-fetches instead of removing locally, keeping
                // message ordering authoritative.
                let fresh = self.gateway.get_ticket(&ticket_id).await?;
                let mut ticket = self.ticket.write().await;
                if let Some(ticket) = ticket.as_mut() {
                    ticket.messages = fresh.messages;
                }
                tracing::info!(%ticket_id, %message_id, "message deleted");
                return Ok(());
            }
        }

        if let Some(status) = request.action.target_status() {
            let mut ticket = self.ticket.write().await;
            if let Some(ticket) = ticket.as_mut() {
                tracing::info!(
                    %ticket_id,
                    from = %ticket.status,
                    to = %status,
                    kind = %request.kind,
                    "guarded action committed"
                );
                ticket.status = status;
            }
        }
        Ok(())
    }

    /// Appends an agent message through the gateway and mirrors it into
    /// the local sequence.
    pub async fn add_message(&self, draft: &MessageDraft) -> Result<Message> {
        let ticket_id = self.selected_id().await?;
        let message = self.gateway.add_message(&ticket_id, draft).await?;
        let mut ticket = self.ticket.write().await;
        if let Some(ticket) = ticket.as_mut() {
            ticket.messages.push(message.clone());
        }
        Ok(message)
    }

    async fn selected_id(&self) -> Result<String> {
        self.ticket
            .read()
            .await
            .as_ref()
            .map(|t| t.id.clone())
            .ok_or_else(|| OpsdeskError::invalid_action("no ticket selected"))
    }

    async fn selected_ticket(&self) -> Result<Ticket> {
        self.ticket
            .read()
            .await
            .clone()
            .ok_or_else(|| OpsdeskError::invalid_action("no ticket selected"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use opsdesk_core::ticket::{Order, SenderType, TicketFilter, TicketPriority};
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn sample_ticket(status: TicketStatus, with_order: bool) -> Ticket {
        Ticket {
            id: "T-1".to_string(),
            subject: "Refund request".to_string(),
            status,
            priority: TicketPriority::High,
            customer_name: Some("Jane Doe".to_string()),
            messages: vec![Message {
                id: "m1".to_string(),
                content: "I want a refund".to_string(),
                sender: SenderType::Customer,
                is_internal: false,
                created_at: Utc::now(),
            }],
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

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        ApproveRefund(String),
        RejectRefund(String),
        Resolve,
        UpdateStatus(TicketStatus),
        DeleteMessage(String),
        GetTicket,
    }

    struct MockTicketGateway {
        ticket: StdMutex<Ticket>,
        calls: StdMutex<Vec<Call>>,
        fail_commits: AtomicBool,
    }

    impl MockTicketGateway {
        fn new(ticket: Ticket) -> Self {
            Self {
                ticket: StdMutex::new(ticket),
                calls: StdMutex::new(Vec::new()),
                fail_commits: AtomicBool::new(false),
            }
        }

        fn record(&self, call: Call) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail_commits.load(Ordering::SeqCst) {
                return Err(OpsdeskError::rejected(Some(503), "backend unavailable"));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TicketGateway for MockTicketGateway {
        async fn get_ticket(&self, _id: &str) -> Result<Ticket> {
            self.calls.lock().unwrap().push(Call::GetTicket);
            Ok(self.ticket.lock().unwrap().clone())
        }

        async fn list_tickets(&self, _filter: &TicketFilter) -> Result<Vec<Ticket>> {
            Ok(vec![self.ticket.lock().unwrap().clone()])
        }

        async fn update_status(&self, _id: &str, status: TicketStatus) -> Result<()> {
            self.record(Call::UpdateStatus(status))
        }

        async fn resolve(&self, _id: &str) -> Result<()> {
            self.record(Call::Resolve)
        }

        async fn add_message(&self, _id: &str, draft: &MessageDraft) -> Result<Message> {
            Ok(Message {
                id: "m-new".to_string(),
                content: draft.content.clone(),
                sender: SenderType::Agent,
                is_internal: draft.is_internal,
                created_at: Utc::now(),
            })
        }

        async fn delete_message(&self, _id: &str, message_id: &str) -> Result<()> {
            self.record(Call::DeleteMessage(message_id.to_string()))?;
            self.ticket
                .lock()
                .unwrap()
                .messages
                .retain(|m| m.id != message_id);
            Ok(())
        }

        async fn approve_refund(&self, _id: &str, approval: &RefundApproval) -> Result<()> {
            self.record(Call::ApproveRefund(approval.order_id.clone()))
        }

        async fn reject_refund(&self, _id: &str, reason: &str) -> Result<()> {
            self.record(Call::RejectRefund(reason.to_string()))
        }
    }

    fn approve_action() -> GuardedAction {
        GuardedAction::ApproveRefund {
            order_id: "O123".to_string(),
            amount: 42.50,
            reason: "damaged item".to_string(),
        }
    }

    #[tokio::test]
    async fn test_approve_refund_success_resolves_optimistically() {
        let gateway = Arc::new(MockTicketGateway::new(sample_ticket(
            TicketStatus::Open,
            true,
        )));
        let workflow = TicketWorkflow::new(gateway.clone());
        workflow.select("T-1").await.unwrap();

        workflow.request(approve_action()).await.unwrap();
        workflow.confirm().await.unwrap();

        assert_eq!(
            workflow.current().await.unwrap().status,
            TicketStatus::Resolved
        );
        // Optimistic: the commit call is the only gateway traffic after
        // the initial load.
        assert_eq!(
            gateway.calls(),
            vec![Call::GetTicket, Call::ApproveRefund("O123".to_string())]
        );
    }

    #[tokio::test]
    async fn test_approve_refund_failure_leaves_status_unchanged() {
        let gateway = Arc::new(MockTicketGateway::new(sample_ticket(
            TicketStatus::Open,
            true,
        )));
        gateway.fail_commits.store(true, Ordering::SeqCst);
        let workflow = TicketWorkflow::new(gateway.clone());
        workflow.select("T-1").await.unwrap();

        workflow.request(approve_action()).await.unwrap();
        let err = workflow.confirm().await.unwrap_err();

        assert!(matches!(err, OpsdeskError::Rejected { .. }));
        assert_eq!(workflow.current().await.unwrap().status, TicketStatus::Open);
        assert!(workflow.pending().await.is_none());

        // Retry by initiating again once the backend recovers.
        gateway.fail_commits.store(false, Ordering::SeqCst);
        workflow.request(approve_action()).await.unwrap();
        workflow.confirm().await.unwrap();
        assert_eq!(
            workflow.current().await.unwrap().status,
            TicketStatus::Resolved
        );
    }

    #[tokio::test]
    async fn test_request_without_confirmation_has_no_network_effect() {
        let gateway = Arc::new(MockTicketGateway::new(sample_ticket(
            TicketStatus::Open,
            true,
        )));
        let workflow = TicketWorkflow::new(gateway.clone());
        workflow.select("T-1").await.unwrap();

        workflow.request(approve_action()).await.unwrap();
        workflow.cancel().await;

        assert_eq!(gateway.calls(), vec![Call::GetTicket]);
        assert_eq!(workflow.current().await.unwrap().status, TicketStatus::Open);
        assert!(workflow.pending().await.is_none());
    }

    #[tokio::test]
    async fn test_confirm_without_request_is_rejected() {
        let gateway = Arc::new(MockTicketGateway::new(sample_ticket(
            TicketStatus::Open,
            true,
        )));
        let workflow = TicketWorkflow::new(gateway);
        workflow.select("T-1").await.unwrap();

        let err = workflow.confirm().await.unwrap_err();
        assert!(matches!(err, OpsdeskError::InvalidAction(_)));
    }

    #[tokio::test]
    async fn test_reopen_only_available_from_resolved() {
        let gateway = Arc::new(MockTicketGateway::new(sample_ticket(
            TicketStatus::Open,
            false,
        )));
        let workflow = TicketWorkflow::new(gateway.clone());
        workflow.select("T-1").await.unwrap();

        let err = workflow.request(GuardedAction::Reopen).await.unwrap_err();
        assert!(matches!(err, OpsdeskError::InvalidAction(_)));
        assert!(workflow.pending().await.is_none());
    }

    #[tokio::test]
    async fn test_reopen_moves_resolved_back_to_in_progress() {
        let gateway = Arc::new(MockTicketGateway::new(sample_ticket(
            TicketStatus::Resolved,
            false,
        )));
        let workflow = TicketWorkflow::new(gateway.clone());
        workflow.select("T-1").await.unwrap();

        workflow.request(GuardedAction::Reopen).await.unwrap();
        workflow.confirm().await.unwrap();

        assert_eq!(
            workflow.current().await.unwrap().status,
            TicketStatus::InProgress
        );
        assert!(
            gateway
                .calls()
                .contains(&Call::UpdateStatus(TicketStatus::InProgress))
        );
    }

    #[tokio::test]
    async fn test_reject_refund_without_order_resolves() {
        let gateway = Arc::new(MockTicketGateway::new(sample_ticket(
            TicketStatus::InProgress,
            false,
        )));
        let workflow = TicketWorkflow::new(gateway.clone());
        workflow.select("T-1").await.unwrap();

        workflow
            .request(GuardedAction::RejectRefund {
                reason: "outside return window".to_string(),
            })
            .await
            .unwrap();
        workflow.confirm().await.unwrap();

        assert_eq!(
            workflow.current().await.unwrap().status,
            TicketStatus::Resolved
        );
        assert!(
            gateway
                .calls()
                .contains(&Call::RejectRefund("outside return window".to_string()))
        );
    }

    #[tokio::test]
    async fn test_delete_message_refetches_the_sequence() {
        let gateway = Arc::new(MockTicketGateway::new(sample_ticket(
            TicketStatus::Open,
            false,
        )));
        let workflow = TicketWorkflow::new(gateway.clone());
        workflow.select("T-1").await.unwrap();

        workflow
            .request(GuardedAction::DeleteMessage {
                message_id: "m1".to_string(),
            })
            .await
            .unwrap();
        workflow.confirm().await.unwrap();

        assert!(workflow.current().await.unwrap().messages.is_empty());
        assert_eq!(
            gateway.calls(),
            vec![
                Call::GetTicket,
                Call::DeleteMessage("m1".to_string()),
                Call::GetTicket,
            ]
        );
    }

    #[tokio::test]
    async fn test_new_request_replaces_unconfirmed_one() {
        let gateway = Arc::new(MockTicketGateway::new(sample_ticket(
            TicketStatus::Open,
            true,
        )));
        let workflow = TicketWorkflow::new(gateway.clone());
        workflow.select("T-1").await.unwrap();

        workflow.request(approve_action()).await.unwrap();
        workflow.request(GuardedAction::Resolve).await.unwrap();
        workflow.confirm().await.unwrap();

        // Only the replacing action was committed.
        assert_eq!(gateway.calls(), vec![Call::GetTicket, Call::Resolve]);
    }

    #[tokio::test]
    async fn test_add_message_appends_locally() {
        let gateway = Arc::new(MockTicketGateway::new(sample_ticket(
            TicketStatus::Open,
            false,
        )));
        let workflow = TicketWorkflow::new(gateway);
        workflow.select("T-1").await.unwrap();

        let draft = MessageDraft::new("On it, checking now.", false);
        let message = workflow.add_message(&draft).await.unwrap();

        assert_eq!(message.sender, SenderType::Agent);
        let ticket = workflow.current().await.unwrap();
        assert_eq!(ticket.messages.len(), 2);
        assert_eq!(ticket.messages.last().unwrap().content, "On it, checking now.");
    }
}
