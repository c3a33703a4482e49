//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific flow.
//! Use cases orchestrate across entity modules to fulfill user stories.

pub mod batch;
pub mod tryon;

pub use batch::BatchOrchestrator;
pub use tryon::TryOnSession;
