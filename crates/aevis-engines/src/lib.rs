//! # aevis-engines
//!
//! Answer engine adapters for aevis.
//!
//! This crate provides:
//! - Simulation adapter with tunable presence/citation/failure rates
//! - HTTP adapter for engines reachable through a probe service
//! - Ordered engine registry driving check fan-out
//!
//! # Example
//!
//! ```rust
//! use aevis_engines::{EngineRegistry, SimulationAdapter};
//! use std::sync::Arc;
//!
//! let mut registry = EngineRegistry::new();
//! registry.register(Arc::new(SimulationAdapter::new("Gemini").with_seed(1)));
//! assert_eq!(registry.len(), 1);
//! ```

pub mod http;
pub mod registry;
pub mod simulation;

pub use http::HttpEngineAdapter;
pub use registry::EngineRegistry;
pub use simulation::SimulationAdapter;
