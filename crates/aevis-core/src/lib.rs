//! # aevis-core
//!
//! Core types, traits, and abstractions for the AEVIS answer-engine
//! visibility pipeline.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the storage, engine, pipeline, analytics, and API
//! crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{extract_timestamp, is_v7, new_v7};
