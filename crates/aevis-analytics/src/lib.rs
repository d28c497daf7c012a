//! # aevis-analytics
//!
//! Read-side aggregation over the observation store.
//!
//! This crate provides:
//! - Trailing 24-hour KPI snapshots (visibility score, keyword count,
//!   engine coverage)
//! - The 30-day daily visibility trend series
//! - Heuristic recommendations ("missing" and "uncited" rules)
//!
//! Nothing here is persisted; every value is derived from the observation
//! log at query time, so aggregation is idempotent for an unchanged store.

pub mod kpi;
pub mod recommendations;
pub mod trend;

pub use kpi::{get_kpis, get_kpis_at};
pub use recommendations::{
    get_recommendations, get_recommendations_at, normalize_domain, RecommendationCaps,
};
pub use trend::{get_trend, get_trend_at};
