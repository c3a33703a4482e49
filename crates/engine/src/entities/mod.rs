//! Entity modules - Domain capability encapsulation.
//!
//! Each module wraps a service port with the rules that hold for every caller.
//! They are the building blocks for use cases.

pub mod compose;
pub mod generation;

pub use compose::ComposeStep;
pub use generation::GenerationClient;
