//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - The generation service (could swap HTTP -> queue)
//! - The compose service
//! - Result persistence (could swap in-memory -> hosted store)
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;

pub use error::{ComposeError, GenerationError, RepoError};
pub use external::{
    ComposePort, ComposeRequest, GenerationOutput, GenerationPort, GenerationRequest,
};
pub use repos::ResultRepo;
pub use testing::ClockPort;

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockComposePort, MockGenerationPort};
#[cfg(test)]
pub use repos::MockResultRepo;
#[cfg(test)]
pub use testing::MockClockPort;
