//! Domain entities - Core business objects with identity

mod batch_job;
mod garment;
mod generation_result;

pub use batch_job::{
    BatchArtifact, BatchJob, BatchPieceState, BatchProgress, PieceFailure, PieceFailureKind,
};
pub use garment::{GarmentKey, GarmentSelection};
pub use generation_result::GenerationResult;
