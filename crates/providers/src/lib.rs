//! Reasoning service clients.
//!
//! The orchestration core talks to the reasoning service through the
//! `ReasoningClient` trait; this crate provides the OpenAI-compatible
//! implementation that covers OpenAI, OpenRouter, DeepSeek, Ollama, vLLM,
//! and any other `/v1/chat/completions` endpoint.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;
