//! Vision/completion provider integration.
//!
//! Provides the provider abstraction used by the local analyzer, the tag
//! suggester and search, plus the Chat Completions client behind it.

#[cfg(test)]
pub(crate) mod mock;
pub(crate) mod openai;
pub(crate) mod provider;

pub use provider::{ImageInput, LlmProvider, LlmProviderFactory, LlmRequest, LlmResponse};
