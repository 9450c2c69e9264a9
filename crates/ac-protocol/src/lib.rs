//! ac-protocol: Shared types and message definitions for AdvisorChat.
//!
//! This crate defines the types used between the core client logic,
//! the streaming backend, and any frontends.

pub mod conversation;
pub mod message;

pub use conversation::{ChatMessage, ChatRequest, Conversation, Role};
pub use message::StreamEvent;
