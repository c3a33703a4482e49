//! # Try-On Domain Types
//!
//! Shared vocabulary types that form the innermost layer. Pure data, no I/O,
//! all serializable.

// Garment types
mod garment_types;
pub use garment_types::{GarmentCategory, GarmentSource};

// Generation types
mod model_tier;
pub use model_tier::{ModelTier, MAX_RETRIES};

mod feedback;
pub use feedback::{ResultStatus, UserFeedback};

// Batch types
mod batch_status;
pub use batch_status::{BatchStatus, PieceStatus};
