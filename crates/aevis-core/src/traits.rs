//! Core traits for the AEVIS pipeline seams.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable storage backends, simulated engines, and
//! hermetic testing.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// OBSERVATION STORE
// =============================================================================

/// Append-only persistence for observations; the source of truth for all
/// aggregation.
///
/// `append_batch` is the privileged write path: it is only reachable from
/// the check orchestrator after its ownership check, never from arbitrary
/// API callers.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Atomically append one run's batch of observations.
    ///
    /// All-or-nothing: if any draft fails validation, references an
    /// unknown keyword, or carries a `project_id`/`owner_user_id` that
    /// does not match its keyword row, the whole batch is rejected and
    /// nothing is written.
    async fn append_batch(&self, batch: Vec<NewObservation>) -> Result<Vec<Observation>>;

    /// Query observations for a project, ordered by timestamp descending.
    async fn query(
        &self,
        project_id: Uuid,
        filter: ObservationFilter,
    ) -> Result<Vec<Observation>>;
}

// =============================================================================
// READ-ONLY COLLABORATOR REPOSITORIES
// =============================================================================

/// Read-only access to project records owned by the external CRUD
/// collaborator.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Fetch a project by id.
    async fn get(&self, id: Uuid) -> Result<Option<Project>>;
}

/// Read-only access to keyword records owned by the external CRUD
/// collaborator.
#[async_trait]
pub trait KeywordRepository: Send + Sync {
    /// Fetch a keyword by id.
    async fn get(&self, id: Uuid) -> Result<Option<Keyword>>;

    /// Count keywords tracked under a project.
    async fn count_for_project(&self, project_id: Uuid) -> Result<i64>;
}

// =============================================================================
// ENGINE ADAPTER
// =============================================================================

/// One answer engine being probed for brand presence.
///
/// Implementations must not share mutable state between invocations; the
/// orchestrator owns the per-call timeout and retry policy.
#[async_trait]
pub trait EngineAdapter: Send + Sync {
    /// Registry identifier of this engine.
    fn engine(&self) -> &EngineId;

    /// Human-readable engine name.
    fn display_name(&self) -> &str;

    /// Probe the engine for the keyword in the given brand context.
    async fn check(&self, keyword: &Keyword, brand: &BrandContext) -> Result<EngineAnswer>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedAdapter {
        id: EngineId,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EngineAdapter for FixedAdapter {
        fn engine(&self) -> &EngineId {
            &self.id
        }

        fn display_name(&self) -> &str {
            self.id.as_str()
        }

        async fn check(&self, keyword: &Keyword, brand: &BrandContext) -> Result<EngineAnswer> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EngineAnswer {
                presence: true,
                position: Some(1),
                answer_snippet: format!("{} about \"{}\"", brand.brand_name, keyword.text),
                citations_count: 1,
                observed_urls: vec![brand.domain.clone()],
            })
        }
    }

    fn keyword() -> Keyword {
        Keyword {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            text: "edge functions".to_string(),
        }
    }

    #[tokio::test]
    async fn test_engine_adapter_object_safety() {
        let adapter: Box<dyn EngineAdapter> = Box::new(FixedAdapter {
            id: EngineId::new("Fixed"),
            calls: AtomicUsize::new(0),
        });

        let brand = BrandContext {
            domain: "example.com".to_string(),
            brand_name: "Example".to_string(),
        };
        let answer = adapter.check(&keyword(), &brand).await.unwrap();
        assert!(answer.presence);
        assert_eq!(answer.observed_urls, vec!["example.com"]);
        assert_eq!(adapter.engine().as_str(), "Fixed");
    }

    struct FailingStore;

    #[async_trait]
    impl ObservationStore for FailingStore {
        async fn append_batch(&self, _batch: Vec<NewObservation>) -> Result<Vec<Observation>> {
            Err(Error::Internal("store offline".into()))
        }

        async fn query(
            &self,
            _project_id: Uuid,
            _filter: ObservationFilter,
        ) -> Result<Vec<Observation>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_observation_store_object_safety() {
        let store: Box<dyn ObservationStore> = Box::new(FailingStore);
        assert!(store.append_batch(Vec::new()).await.is_err());
        assert!(store
            .query(Uuid::new_v4(), ObservationFilter::default())
            .await
            .unwrap()
            .is_empty());
    }
}
