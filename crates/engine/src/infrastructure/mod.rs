//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod compose_http;
pub mod config;
pub mod generation_http;
pub mod memory_results;
pub mod ports;
