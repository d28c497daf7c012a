//! Core data models for the AEVIS visibility pipeline.
//!
//! These types are shared across all AEVIS crates and represent the core
//! domain entities: tracked projects and keywords, engine identifiers, and
//! the append-only observation log they feed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::uuid_utils::new_v7;

// =============================================================================
// PROJECT / KEYWORD TYPES
// =============================================================================

/// A tracked brand project.
///
/// Created and owned by the external CRUD collaborator; the pipeline only
/// reads projects. `domain` is the tracked web domain used for citation
/// matching and is never empty.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub domain: String,
    pub brand_name: String,
}

/// A tracked keyword query under a project.
///
/// `project_id` and `owner_user_id` never change after creation; the
/// observation store relies on that to enforce its denormalization
/// invariant at write time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Keyword {
    pub id: Uuid,
    pub project_id: Uuid,
    pub owner_user_id: Uuid,
    pub text: String,
}

// =============================================================================
// ENGINE TYPES
// =============================================================================

/// Identifier of an answer engine in the open adapter registry.
///
/// Deliberately a newtype over a string rather than an enum: new engines
/// are registered at startup without touching orchestration or aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineId(pub String);

impl EngineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EngineId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Brand context handed to engine adapters alongside the keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandContext {
    /// Tracked web domain (e.g. `example.com`).
    pub domain: String,
    /// Display brand name the engines are probed for.
    pub brand_name: String,
}

impl BrandContext {
    pub fn for_project(project: &Project) -> Self {
        Self {
            domain: project.domain.clone(),
            brand_name: project.brand_name.clone(),
        }
    }
}

/// Raw answer produced by one engine adapter call, before it is stamped
/// with run identity and committed as an [`Observation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineAnswer {
    pub presence: bool,
    pub position: Option<i32>,
    pub answer_snippet: String,
    pub citations_count: i32,
    pub observed_urls: Vec<String>,
}

impl EngineAnswer {
    /// An answer synthesized when an adapter failed after its retry.
    ///
    /// Keeps the run complete (one observation per engine) while marking
    /// the entry as degraded via the snippet tag.
    pub fn unavailable(reason: &str) -> Self {
        Self {
            presence: false,
            position: None,
            answer_snippet: format!("{} {}", crate::defaults::DEGRADED_SNIPPET_TAG, reason),
            citations_count: 0,
            observed_urls: Vec::new(),
        }
    }

    /// True when this answer carries the degraded marker.
    pub fn is_degraded(&self) -> bool {
        self.answer_snippet
            .starts_with(crate::defaults::DEGRADED_SNIPPET_TAG)
    }
}

// =============================================================================
// OBSERVATION TYPES
// =============================================================================

/// One immutable fact record: did the brand appear for a keyword on a
/// given engine at a given time.
///
/// Observations are append-only: never updated or deleted in normal
/// operation. `project_id` and `owner_user_id` are denormalized copies of
/// the keyword's values and always match them.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Observation {
    pub id: Uuid,
    pub keyword_id: Uuid,
    pub project_id: Uuid,
    pub owner_user_id: Uuid,
    pub engine: String,
    pub presence: bool,
    pub position: Option<i32>,
    pub answer_snippet: String,
    pub citations_count: i32,
    pub observed_urls: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    /// True when this observation was synthesized from an adapter failure.
    pub fn is_degraded(&self) -> bool {
        self.answer_snippet
            .starts_with(crate::defaults::DEGRADED_SNIPPET_TAG)
    }
}

/// Insertion form of an observation, validated before any write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewObservation {
    pub keyword_id: Uuid,
    pub project_id: Uuid,
    pub owner_user_id: Uuid,
    pub engine: EngineId,
    pub presence: bool,
    pub position: Option<i32>,
    pub answer_snippet: String,
    pub citations_count: i32,
    pub observed_urls: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl NewObservation {
    /// Build an observation draft from an engine answer, stamping it with
    /// the run's shared timestamp and the keyword's identity.
    pub fn from_answer(
        keyword: &Keyword,
        engine: EngineId,
        answer: EngineAnswer,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            keyword_id: keyword.id,
            project_id: keyword.project_id,
            owner_user_id: keyword.owner_user_id,
            engine,
            presence: answer.presence,
            position: answer.position,
            answer_snippet: answer.answer_snippet,
            citations_count: answer.citations_count,
            observed_urls: answer.observed_urls,
            timestamp,
        }
    }

    /// Enforce the observation invariants.
    ///
    /// - `position` is `Some` exactly when `presence` is true, and ≥ 1.
    /// - `citations_count` is ≥ 0, and 0 when the brand is absent.
    pub fn validate(&self) -> Result<()> {
        match (self.presence, self.position) {
            (true, None) => {
                return Err(Error::InvalidInput(
                    "observation with presence=true must carry a position".into(),
                ))
            }
            (false, Some(_)) => {
                return Err(Error::InvalidInput(
                    "observation with presence=false must not carry a position".into(),
                ))
            }
            (true, Some(p)) if p < 1 => {
                return Err(Error::InvalidInput(format!(
                    "observation position must be >= 1, got {}",
                    p
                )))
            }
            _ => {}
        }

        if self.citations_count < 0 {
            return Err(Error::InvalidInput(format!(
                "citations_count must be >= 0, got {}",
                self.citations_count
            )));
        }
        if !self.presence && self.citations_count != 0 {
            return Err(Error::InvalidInput(
                "observation with presence=false must have citations_count=0".into(),
            ));
        }

        Ok(())
    }

    /// Promote a validated draft into a committed observation with a
    /// freshly generated UUIDv7 identity.
    pub fn into_observation(self) -> Observation {
        Observation {
            id: new_v7(),
            keyword_id: self.keyword_id,
            project_id: self.project_id,
            owner_user_id: self.owner_user_id,
            engine: self.engine.0,
            presence: self.presence,
            position: self.position,
            answer_snippet: self.answer_snippet,
            citations_count: self.citations_count,
            observed_urls: self.observed_urls,
            timestamp: self.timestamp,
        }
    }
}

/// Filter for observation store queries.
///
/// Results are always ordered by timestamp descending; every field other
/// than `project_id` is optional.
#[derive(Debug, Clone, Default)]
pub struct ObservationFilter {
    pub keyword_id: Option<Uuid>,
    pub engine: Option<EngineId>,
    pub presence: Option<bool>,
    /// Inclusive lower bound on `timestamp`.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `timestamp`.
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl ObservationFilter {
    /// Trailing-window filter: observations in `[now - window, now)`.
    pub fn trailing(window: chrono::Duration, now: DateTime<Utc>) -> Self {
        Self {
            since: Some(now - window),
            until: Some(now),
            ..Default::default()
        }
    }

    pub fn with_presence(mut self, presence: bool) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_engine(mut self, engine: EngineId) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_keyword(mut self, keyword_id: Uuid) -> Self {
        self.keyword_id = Some(keyword_id);
        self
    }
}

// =============================================================================
// DERIVED ANALYTICS TYPES (never persisted)
// =============================================================================

/// Point-in-time KPIs for a project over the trailing 24-hour window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    /// Percentage of observations with presence=true; 0.0 for an empty window.
    pub visibility_score: f64,
    /// Count of keywords tracked under the project.
    pub total_keywords: i64,
    /// Distinct engines that produced observations in the window.
    pub engines_covered: i64,
}

/// One day of the visibility trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// UTC calendar day.
    pub day: NaiveDate,
    /// Visibility percentage for that day.
    pub visibility: f64,
}

/// Heuristic classification of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    /// The brand did not appear for a keyword on an engine.
    Missing,
    /// The brand appeared but the tracked domain was not cited.
    Uncited,
}

/// A derived, best-effort action item surfaced from recent observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Stable identifier (`miss-{keyword}-{engine}` / `cite-{keyword}-{engine}`).
    pub id: String,
    pub message: String,
    pub kind: RecommendationKind,
}
