//! Wire types for the two chat-completion protocols the bridge translates
//! between.
//!
//! - [`anthropic`]: the public surface (Anthropic Messages API) spoken by
//!   clients such as Claude Code.
//! - [`backend`]: the ChatGPT Codex surface (OpenAI Responses API) spoken
//!   by the upstream.
//!
//! Both modules are plain serde types with no behavior; all conversion
//! logic lives in `crate::translate`.

pub mod anthropic;
pub mod backend;
