//! Batch try-on use cases.

mod orchestrator;

pub use orchestrator::{BatchError, BatchOrchestrator};
