//! Try-on engine library.
//!
//! Orchestrates garment fitting requests against an external generation
//! service: single-garment retries with quality escalation, bounded result
//! sets, and multi-piece "whole look" batches.
//!
//! ## Structure
//!
//! - `entities/` - Wrappers around service ports with the rules every caller shares
//! - `use_cases/` - Interactive session and batch orchestration
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `app` - Application composition

pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
