//! # aevis-pipeline
//!
//! Check orchestration for aevis.
//!
//! This crate provides:
//! - Per-keyword run leases with TTL-based reclamation
//! - The check orchestrator: ownership gate, concurrent engine fan-out
//!   with retry-then-degrade, atomic batch commit

pub mod lease;
pub mod orchestrator;

pub use lease::{RunLeaseGuard, RunLeaseManager};
pub use orchestrator::{CheckOrchestrator, OrchestratorConfig};
