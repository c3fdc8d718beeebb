//! Kernel module - server infrastructure and dependencies.

pub mod assistant;
pub mod deps;
pub mod events;
pub mod sse;
pub mod stream_log;
pub mod stream_reader;
pub mod stream_writer;

pub use assistant::{Assistant, CompletionStream, ScriptedAssistant};
pub use deps::ServerDeps;
pub use events::{ActionEvent, DecodeError, MessagePayload};
pub use stream_log::{LogCursor, LogError, LogReadError, LogReaderConn, LogRecord, StreamLog};
pub use stream_reader::subscribe;
pub use stream_writer::StreamWriter;
