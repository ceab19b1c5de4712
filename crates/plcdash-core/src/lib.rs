//! # plcdash-core
//!
//! Core plcdash data model and variable cache.
//!
//! This crate provides:
//! - Variable descriptors, typed values and temperature records
//! - Address mapping between coil/holding-register numbers and wire indices
//! - Client-side input validation for writes
//! - The per-variable cache with "last response wins" sequencing
//! - Display-state projection for renderers
//! - Configuration storage abstraction
//!
//! This crate is intentionally runtime-agnostic and contains no async code.
//! The HTTP client and pollers live in `plcdash-client`.

pub mod address;
pub mod cache;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod render;
pub mod temperature;

pub use cache::{CacheEntry, Completion, Ticket, VariableCache};
pub use error::{OperationResult, SyncError};
pub use model::*;
pub use temperature::*;
