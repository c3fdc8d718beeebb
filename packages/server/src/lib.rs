// Assistant Actions API
//
// Backend for the assistant app's action streams: a per-(user, action)
// append-only event log, a cancellable reader, and an SSE bridge that
// serves live agent output to HTTP clients. Conversation history replay
// goes through the chat consolidator instead of the log.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
