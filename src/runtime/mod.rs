//! Execution runtime: the single hardware thread and its completion tokens.

pub mod command_queue;
pub mod completion;

pub use command_queue::{CommandQueue, WorkerContext};
pub use completion::{completion, Completion, CompletionToken};
