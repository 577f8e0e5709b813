mod client;
mod config;

pub use client::{CompletionClient, LlmError, LlmResult, OpenAiClient};
pub use config::LlmConfig;
