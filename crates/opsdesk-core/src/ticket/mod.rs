//! Ticket domain: entities and lifecycle transition rules.

pub mod lifecycle;
pub mod model;

pub use lifecycle::{can_transition, ConfirmationRequest, GuardedAction, GuardedActionKind};
pub use model::{
    Message, MessageDraft, Order, RefundApproval, SenderType, Ticket, TicketFilter,
    TicketPriority, TicketStatus,
};
