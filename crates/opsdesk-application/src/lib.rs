//! Application layer for the Opsdesk console.
//!
//! This crate provides the orchestration services that sit between the
//! domain layer and the gateway/storage implementations: the insight
//! cache, the debounced knowledge search, the guarded ticket workflow,
//! template management, and the assistance-panel composition root.

pub mod insight_cache;
pub mod panel;
pub mod search;
pub mod templates;
pub mod workflow;

pub use insight_cache::{CacheState, InsightCache, InsightRequest, InsightSnapshot};
pub use panel::AssistancePanel;
pub use search::{KnowledgeSearch, SearchOutcome};
pub use templates::{ActivityEntry, ActivityKind, TemplateService};
pub use workflow::TicketWorkflow;
