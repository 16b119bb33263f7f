//! Protocol translation - Anthropic Messages ↔ ChatGPT Codex (Responses API)
//!
//! Two one-way translators bracket the backend call:
//!
//! ```text
//! Client request (Anthropic Messages)
//!     ↓
//! request::translate_request → Codex Responses request
//!     ↓
//! [backend call + stream assembly - crate::backend]
//!     ↓
//! response::translate_response → Anthropic Messages response
//!     ↓
//! Client response (JSON, or replayed SSE via crate::stream)
//! ```
//!
//! Translation never fails: malformed optional fields degrade to the
//! documented fallbacks. Request validity (model/messages present) is the
//! HTTP layer's job, before the translator runs.

pub mod request;
pub mod response;

pub use request::translate_request;
pub use response::translate_response;
