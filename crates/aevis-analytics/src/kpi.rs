//! Windowed KPI aggregation.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use aevis_core::{
    defaults, KeywordRepository, KpiSnapshot, ObservationFilter, ObservationStore, Result,
};

/// KPIs for a project over the trailing 24-hour window ending now.
pub async fn get_kpis(
    store: &dyn ObservationStore,
    keywords: &dyn KeywordRepository,
    project_id: Uuid,
) -> Result<KpiSnapshot> {
    get_kpis_at(store, keywords, project_id, Utc::now()).await
}

/// KPIs with an explicit query time, so aggregation is reproducible.
pub async fn get_kpis_at(
    store: &dyn ObservationStore,
    keywords: &dyn KeywordRepository,
    project_id: Uuid,
    now: DateTime<Utc>,
) -> Result<KpiSnapshot> {
    let total_keywords = keywords.count_for_project(project_id).await?;

    let window = Duration::hours(defaults::KPI_WINDOW_HOURS);
    let observations = store
        .query(project_id, ObservationFilter::trailing(window, now))
        .await?;

    let total = observations.len();
    let present = observations.iter().filter(|o| o.presence).count();
    let engines: HashSet<&str> = observations.iter().map(|o| o.engine.as_str()).collect();

    // An empty window scores 0, not NaN.
    let visibility_score = if total == 0 {
        0.0
    } else {
        100.0 * present as f64 / total as f64
    };

    debug!(
        subsystem = "analytics",
        op = "get_kpis",
        %project_id,
        observation_count = total,
        "Computed KPI snapshot"
    );

    Ok(KpiSnapshot {
        visibility_score,
        total_keywords,
        engines_covered: engines.len() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aevis_db::memory::MemoryDatabase;
    use aevis_core::{EngineId, NewObservation};

    async fn seed_run(
        db: &MemoryDatabase,
        keyword: &aevis_core::Keyword,
        at: DateTime<Utc>,
        flags: &[(&str, bool)],
    ) {
        let drafts: Vec<NewObservation> = flags
            .iter()
            .map(|(engine, presence)| NewObservation {
                keyword_id: keyword.id,
                project_id: keyword.project_id,
                owner_user_id: keyword.owner_user_id,
                engine: EngineId::new(*engine),
                presence: *presence,
                position: presence.then_some(1),
                answer_snippet: String::new(),
                citations_count: if *presence { 1 } else { 0 },
                observed_urls: Vec::new(),
                timestamp: at,
            })
            .collect();
        db.store.append_batch(drafts).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_window_scores_zero() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let project = db.seed_project(owner, "P", "example.com", "Example");
        db.seed_keyword(&project, "cloud hosting");

        let kpis = get_kpis(&db.store, &db.keywords, project.id).await.unwrap();
        assert_eq!(kpis.visibility_score, 0.0);
        assert_eq!(kpis.total_keywords, 1);
        assert_eq!(kpis.engines_covered, 0);
    }

    #[tokio::test]
    async fn test_full_presence_scores_hundred() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let project = db.seed_project(owner, "P", "example.com", "Example");
        let keyword = db.seed_keyword(&project, "cloud hosting");

        let now = Utc::now();
        seed_run(
            &db,
            &keyword,
            now - Duration::minutes(5),
            &[("Gemini", true), ("Perplexity", true), ("ChatGPT", true)],
        )
        .await;

        let kpis = get_kpis_at(&db.store, &db.keywords, project.id, now)
            .await
            .unwrap();
        assert_eq!(kpis.visibility_score, 100.0);
        assert_eq!(kpis.engines_covered, 3);
    }

    #[tokio::test]
    async fn test_two_of_three_present() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let project = db.seed_project(owner, "P", "example.com", "Example");
        let keyword = db.seed_keyword(&project, "cloud hosting");

        let now = Utc::now();
        seed_run(
            &db,
            &keyword,
            now - Duration::minutes(5),
            &[("Gemini", false), ("Perplexity", true), ("ChatGPT", true)],
        )
        .await;

        let kpis = get_kpis_at(&db.store, &db.keywords, project.id, now)
            .await
            .unwrap();
        assert!((kpis.visibility_score - 200.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_observations_outside_window_excluded() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let project = db.seed_project(owner, "P", "example.com", "Example");
        let keyword = db.seed_keyword(&project, "cloud hosting");

        let now = Utc::now();
        seed_run(&db, &keyword, now - Duration::hours(25), &[("Gemini", true)]).await;
        seed_run(&db, &keyword, now - Duration::hours(1), &[("Gemini", false)]).await;

        let kpis = get_kpis_at(&db.store, &db.keywords, project.id, now)
            .await
            .unwrap();
        assert_eq!(kpis.visibility_score, 0.0);
        assert_eq!(kpis.engines_covered, 1);
    }

    #[tokio::test]
    async fn test_score_stays_in_range() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let project = db.seed_project(owner, "P", "example.com", "Example");
        let keyword = db.seed_keyword(&project, "cloud hosting");

        let now = Utc::now();
        for i in 0..10i64 {
            seed_run(
                &db,
                &keyword,
                now - Duration::minutes(i),
                &[("Gemini", i % 2 == 0)],
            )
            .await;
        }

        let kpis = get_kpis_at(&db.store, &db.keywords, project.id, now)
            .await
            .unwrap();
        assert!((0.0..=100.0).contains(&kpis.visibility_score));
    }
}
