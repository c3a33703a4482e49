//! # Try-On Domain
//!
//! Entities, value objects and vocabulary types for the garment fitting core.
//! Pure data and invariants; no I/O.

pub mod entities;
pub mod error;
pub mod ids;
pub mod types;
pub mod value_objects;

pub use entities::{
    BatchArtifact, BatchJob, BatchPieceState, BatchProgress, GarmentKey, GarmentSelection,
    GenerationResult, PieceFailure, PieceFailureKind,
};
pub use error::DomainError;
pub use ids::{BatchJobId, ResultId};
pub use types::{
    BatchStatus, GarmentCategory, GarmentSource, ModelTier, PieceStatus, ResultStatus,
    UserFeedback, MAX_RETRIES,
};
pub use value_objects::{TryOnConfig, MAX_OPTIONS};
