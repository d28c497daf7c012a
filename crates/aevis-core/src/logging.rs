//! Structured logging schema and field name constants for AEVIS.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), run completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (observations, scans) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → run → adapter calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "pipeline", "engines", "analytics"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "orchestrator", "lease", "pool", "simulation", "kpi"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "run_check", "append_batch", "get_kpis", "probe"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Keyword UUID being checked.
pub const KEYWORD_ID: &str = "keyword_id";

/// Project UUID being aggregated.
pub const PROJECT_ID: &str = "project_id";

/// Engine registry identifier.
pub const ENGINE: &str = "engine";

/// Requesting user id on authenticated operations.
pub const USER_ID: &str = "user_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of observations in a batch or result set.
pub const OBSERVATION_COUNT: &str = "observation_count";

/// Number of engines in a run's fan-out.
pub const ENGINE_COUNT: &str = "engine_count";

/// Number of degraded (synthesized) observations in a run.
pub const DEGRADED_COUNT: &str = "degraded_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
