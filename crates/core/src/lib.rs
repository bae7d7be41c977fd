//! # vibeforge core
//!
//! Domain types, traits, and error definitions for the vibeforge planning
//! loop. This crate has **no framework dependencies**; it defines the model
//! that the provider, bridge, agent and gateway crates implement against.
//!
//! The two seams are traits:
//! - [`Provider`]: the model endpoint ("what next, given this conversation?")
//! - [`ToolBridge`]: the tool executor ("run this call, give me a record")

pub mod error;
pub mod message;
pub mod provider;
pub mod text;
pub mod tool;
pub mod trace;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, ToolError};
pub use message::{Conversation, ConversationId, Message, Role};
pub use provider::{ModelStep, Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{ToolBridge, ToolCall, ToolDescriptor, ToolInvocation, ToolKind, ToolOutput, ToolResult};
pub use trace::TraceEvent;
