//! Check run orchestration.
//!
//! A check run probes every registered engine for one keyword, concurrently,
//! and commits the results as a single atomic observation batch. Engines
//! that fail after a retry are recorded as degraded observations rather
//! than dropped, so every committed run has exactly one observation per
//! registered engine, all sharing one timestamp.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use aevis_core::{
    defaults, BrandContext, EngineAdapter, EngineAnswer, Error, Keyword, KeywordRepository,
    NewObservation, Observation, ObservationStore, ProjectRepository, Result,
};
use aevis_engines::EngineRegistry;

use crate::lease::RunLeaseManager;

/// Tuning knobs for a check run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Per-attempt adapter timeout.
    pub adapter_timeout: Duration,
    /// Retries after the first failed attempt.
    pub retries: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            adapter_timeout: Duration::from_secs(defaults::ADAPTER_TIMEOUT_SECS),
            retries: defaults::ADAPTER_RETRIES,
        }
    }
}

impl OrchestratorConfig {
    /// Read overrides from `AEVIS_ADAPTER_TIMEOUT_SECS` and
    /// `AEVIS_ADAPTER_RETRIES`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = std::env::var("AEVIS_ADAPTER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.adapter_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = std::env::var("AEVIS_ADAPTER_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            config.retries = retries;
        }
        config
    }

    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

/// Runs checks: ownership gate, run lease, engine fan-out, atomic commit.
pub struct CheckOrchestrator {
    store: Arc<dyn ObservationStore>,
    keywords: Arc<dyn KeywordRepository>,
    projects: Arc<dyn ProjectRepository>,
    registry: EngineRegistry,
    leases: Arc<RunLeaseManager>,
    config: OrchestratorConfig,
}

impl CheckOrchestrator {
    pub fn new(
        store: Arc<dyn ObservationStore>,
        keywords: Arc<dyn KeywordRepository>,
        projects: Arc<dyn ProjectRepository>,
        registry: EngineRegistry,
        config: OrchestratorConfig,
    ) -> Self {
        // Lease TTL scales with the adapter timeout so a slow but live
        // run is never reclaimed mid-flight.
        let ttl = config.adapter_timeout * defaults::LEASE_TTL_TIMEOUT_MULTIPLE;
        Self {
            store,
            keywords,
            projects,
            registry,
            leases: Arc::new(RunLeaseManager::new(ttl)),
            config,
        }
    }

    /// Run a check for one keyword on behalf of a requesting user.
    ///
    /// Fails before any engine is contacted if the keyword is unknown, the
    /// requester does not own it, its project is missing, or another run
    /// already holds the keyword's lease. After fan-out begins the run
    /// always commits a full batch; adapter failures degrade individual
    /// observations instead of aborting the run.
    pub async fn run_check(
        &self,
        keyword_id: Uuid,
        requester_user_id: Uuid,
    ) -> Result<Vec<Observation>> {
        let start = Instant::now();

        let keyword = self
            .keywords
            .get(keyword_id)
            .await?
            .ok_or(Error::KeywordNotFound(keyword_id))?;

        if keyword.owner_user_id != requester_user_id {
            warn!(
                subsystem = "pipeline",
                %keyword_id,
                user_id = %requester_user_id,
                "Rejected check run for keyword owned by another user"
            );
            return Err(Error::Forbidden(
                "keyword does not belong to the requesting user".to_string(),
            ));
        }

        let project = self
            .projects
            .get(keyword.project_id)
            .await?
            .ok_or(Error::ProjectNotFound(keyword.project_id))?;
        let brand = BrandContext::for_project(&project);

        if self.registry.is_empty() {
            return Err(Error::Config("no engines registered".to_string()));
        }

        // Held for the whole fan-out and commit; released on drop.
        let _lease = self.leases.acquire(keyword_id)?;

        // One timestamp shared by every observation in the run.
        let timestamp = Utc::now();

        let mut tasks = JoinSet::new();
        for (idx, adapter) in self.registry.adapters().iter().enumerate() {
            let adapter = adapter.clone();
            let keyword = keyword.clone();
            let brand = brand.clone();
            let timeout = self.config.adapter_timeout;
            let retries = self.config.retries;
            tasks.spawn(async move {
                let answer = probe_with_retry(&*adapter, &keyword, &brand, timeout, retries).await;
                (idx, answer)
            });
        }

        // Reassemble in registration order regardless of completion order.
        let mut answers: Vec<Option<EngineAnswer>> = vec![None; self.registry.len()];
        while let Some(joined) = tasks.join_next().await {
            let (idx, answer) = joined
                .map_err(|e| Error::Internal(format!("engine probe task failed: {}", e)))?;
            answers[idx] = Some(answer);
        }

        let engine_ids = self.registry.engine_ids();
        let mut drafts = Vec::with_capacity(answers.len());
        let mut degraded = 0usize;
        for (engine, answer) in engine_ids.into_iter().zip(answers) {
            let answer = answer.unwrap_or_else(|| EngineAnswer::unavailable("probe lost"));
            if answer.is_degraded() {
                degraded += 1;
            }
            drafts.push(NewObservation::from_answer(&keyword, engine, answer, timestamp));
        }

        let observations = self.store.append_batch(drafts).await?;

        info!(
            subsystem = "pipeline",
            op = "run_check",
            %keyword_id,
            project_id = %keyword.project_id,
            observation_count = observations.len(),
            degraded_count = degraded,
            duration_ms = start.elapsed().as_millis() as u64,
            "Check run committed"
        );

        Ok(observations)
    }

    /// Lease manager, exposed for status introspection.
    pub fn leases(&self) -> &RunLeaseManager {
        &self.leases
    }
}

/// Probe one engine with a per-attempt timeout and a bounded retry budget.
///
/// Never returns an error: the final failure is converted into a degraded
/// answer so the run can still commit a complete batch.
async fn probe_with_retry(
    adapter: &dyn EngineAdapter,
    keyword: &Keyword,
    brand: &BrandContext,
    timeout: Duration,
    retries: u32,
) -> EngineAnswer {
    let attempts = retries + 1;
    let mut last_failure = String::new();

    for attempt in 1..=attempts {
        match tokio::time::timeout(timeout, adapter.check(keyword, brand)).await {
            Ok(Ok(answer)) => return answer,
            Ok(Err(e)) => {
                warn!(
                    engine = %adapter.engine(),
                    keyword_id = %keyword.id,
                    attempt,
                    error = %e,
                    "Engine probe failed"
                );
                last_failure = e.to_string();
            }
            Err(_) => {
                warn!(
                    engine = %adapter.engine(),
                    keyword_id = %keyword.id,
                    attempt,
                    "Engine probe timed out after {}s",
                    timeout.as_secs()
                );
                last_failure = format!("timed out after {}s", timeout.as_secs());
            }
        }
    }

    EngineAnswer::unavailable(&format!("{}: {}", adapter.display_name(), last_failure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aevis_engines::SimulationAdapter;

    #[test]
    fn test_config_builders() {
        let config = OrchestratorConfig::default()
            .with_adapter_timeout(Duration::from_secs(5))
            .with_retries(2);
        assert_eq!(config.adapter_timeout, Duration::from_secs(5));
        assert_eq!(config.retries, 2);
    }

    #[tokio::test]
    async fn test_probe_with_retry_recovers_after_one_failure() {
        let adapter = SimulationAdapter::new("Gemini")
            .with_presence_rate(1.0)
            .with_seed(1)
            .with_forced_failures(1);
        let keyword = Keyword {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            text: "kw".into(),
        };
        let brand = BrandContext {
            domain: "example.com".into(),
            brand_name: "Example".into(),
        };

        let answer =
            probe_with_retry(&adapter, &keyword, &brand, Duration::from_secs(5), 1).await;
        assert!(!answer.is_degraded());
        assert!(answer.presence);
    }

    #[tokio::test]
    async fn test_probe_with_retry_degrades_after_budget() {
        let adapter = SimulationAdapter::new("Gemini").with_failure_rate(1.0);
        let keyword = Keyword {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            text: "kw".into(),
        };
        let brand = BrandContext {
            domain: "example.com".into(),
            brand_name: "Example".into(),
        };

        let answer =
            probe_with_retry(&adapter, &keyword, &brand, Duration::from_secs(5), 1).await;
        assert!(answer.is_degraded());
        assert!(!answer.presence);
        assert!(answer.answer_snippet.contains("Gemini"));
    }

    #[tokio::test]
    async fn test_probe_with_retry_times_out_slow_adapter() {
        let adapter = SimulationAdapter::new("Gemini")
            .with_presence_rate(1.0)
            .with_latency(Duration::from_secs(30));
        let keyword = Keyword {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            text: "kw".into(),
        };
        let brand = BrandContext {
            domain: "example.com".into(),
            brand_name: "Example".into(),
        };

        let answer =
            probe_with_retry(&adapter, &keyword, &brand, Duration::from_millis(20), 0).await;
        assert!(answer.is_degraded());
        assert!(answer.answer_snippet.contains("timed out"));
    }
}
