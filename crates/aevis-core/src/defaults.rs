//! Centralized default constants for the AEVIS system.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers. When adding new constants, place them in the appropriate section
//! and document the rationale for the chosen value.

// =============================================================================
// ENGINE ADAPTERS
// =============================================================================

/// Per-adapter call timeout in seconds. Sized for a slow LLM-backed answer
/// engine round trip.
pub const ADAPTER_TIMEOUT_SECS: u64 = 30;

/// Retries per adapter call before a run synthesizes a degraded observation.
pub const ADAPTER_RETRIES: u32 = 1;

/// Presence probability of the simulation adapter on a manual check.
pub const SIMULATION_PRESENCE_RATE: f64 = 0.7;

/// Snippet prefix marking an observation synthesized from adapter failure.
pub const DEGRADED_SNIPPET_TAG: &str = "[engine unavailable]";

/// Default engine roster when `AEVIS_ENGINES` is not set.
pub const DEFAULT_ENGINES: [&str; 3] = ["Gemini", "Perplexity", "ChatGPT"];

// =============================================================================
// RUN LEASES
// =============================================================================

/// Lease expiry as a multiple of the adapter timeout, so a crashed
/// orchestrator cannot permanently wedge a keyword.
pub const LEASE_TTL_TIMEOUT_MULTIPLE: u32 = 3;

// =============================================================================
// ANALYTICS WINDOWS
// =============================================================================

/// Trailing window for KPI aggregation and recommendation scans, in hours.
pub const KPI_WINDOW_HOURS: i64 = 24;

/// Trailing window for the daily trend series, in calendar days.
pub const TREND_WINDOW_DAYS: i64 = 30;

/// Scan cap for the "missing on engine" recommendation rule.
pub const RECO_MISSING_SCAN_CAP: i64 = 5;

/// Scan cap for the "present but uncited" recommendation rule.
pub const RECO_UNCITED_SCAN_CAP: i64 = 10;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP listen port for the API server.
pub const API_PORT: u16 = 3400;

/// Default bind address.
pub const API_HOST: &str = "0.0.0.0";
