//! HTTP gateway implementations for the Opsdesk console.
//!
//! Implements the core `TicketGateway` and `InsightGateway` traits over
//! the support backend's REST API. Transport policy beyond a timeout and
//! an optional bearer token (request signing, retry, the global 401
//! redirect) belongs to the embedding application.

pub mod config;
pub mod dto;
pub mod insight_gateway;
pub mod ticket_gateway;

pub use config::GatewayConfig;
pub use insight_gateway::HttpInsightGateway;
pub use ticket_gateway::HttpTicketGateway;
