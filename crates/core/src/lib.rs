//! # Persanna Core
//!
//! Domain types, traits, and error definitions for the Persanna assistant
//! runtime. This crate has **no framework dependencies**: it defines the
//! domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of a conversational turn is a trait here. The language
//! model, the tools, the clock and the formatter are all swappable, which
//! keeps the turn pipeline testable with scripted stand-ins.

pub mod error;
pub mod event;
pub mod host;
pub mod message;
pub mod provider;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, ProviderError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use host::{Clock, DefaultFormatter, ResponseFormatter, SystemClock};
pub use message::{ConversationTurn, Message, MessageToolCall, Role, Speaker, StoredMessage};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use session::{SessionState, SharedUsage, UsageCounters};
pub use tool::{Tool, ToolRegistry};
