//! ac-backend: wire-level client for the AdvisorChat streaming endpoint.
//!
//! This crate turns the platform's chunked chat-stream responses into
//! `StreamEvent` sequences: a line decoder, an event interpreter, the HTTP
//! client, and a mock provider for tests.

pub mod client;
pub mod event;
pub mod mock;
pub mod sse;

pub use client::{ChatClient, ChatError};
pub use mock::{MockConfig, MockResponse};
