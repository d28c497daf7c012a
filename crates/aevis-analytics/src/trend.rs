//! Daily visibility trend series.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use aevis_core::{defaults, ObservationFilter, ObservationStore, Result, TrendPoint};

/// Daily visibility series over the trailing 30 calendar days ending now.
pub async fn get_trend(
    store: &dyn ObservationStore,
    project_id: Uuid,
) -> Result<Vec<TrendPoint>> {
    get_trend_at(store, project_id, Utc::now()).await
}

/// Trend series with an explicit query time.
///
/// Observations are grouped by the UTC calendar day of their timestamp.
/// Days with no observations are omitted, so consumers see a sparse
/// series ordered by day ascending.
pub async fn get_trend_at(
    store: &dyn ObservationStore,
    project_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<TrendPoint>> {
    let window = Duration::days(defaults::TREND_WINDOW_DAYS);
    let observations = store
        .query(project_id, ObservationFilter::trailing(window, now))
        .await?;

    // BTreeMap keeps days sorted ascending for free.
    let mut days: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for observation in &observations {
        let day = observation.timestamp.date_naive();
        let entry = days.entry(day).or_insert((0, 0));
        entry.0 += 1;
        if observation.presence {
            entry.1 += 1;
        }
    }

    debug!(
        subsystem = "analytics",
        op = "get_trend",
        %project_id,
        observation_count = observations.len(),
        day_count = days.len(),
        "Computed trend series"
    );

    Ok(days
        .into_iter()
        .map(|(day, (total, present))| TrendPoint {
            day,
            visibility: 100.0 * present as f64 / total as f64,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aevis_core::{EngineId, NewObservation};
    use aevis_db::memory::MemoryDatabase;

    async fn seed_at(
        db: &MemoryDatabase,
        keyword: &aevis_core::Keyword,
        at: DateTime<Utc>,
        presence: bool,
    ) {
        let draft = NewObservation {
            keyword_id: keyword.id,
            project_id: keyword.project_id,
            owner_user_id: keyword.owner_user_id,
            engine: EngineId::new("Gemini"),
            presence,
            position: presence.then_some(1),
            answer_snippet: String::new(),
            citations_count: if presence { 1 } else { 0 },
            observed_urls: Vec::new(),
            timestamp: at,
        };
        db.store.append_batch(vec![draft]).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_history_yields_empty_series() {
        let db = MemoryDatabase::new();
        let project = db.seed_project(Uuid::new_v4(), "P", "example.com", "Example");
        let trend = get_trend(&db.store, project.id).await.unwrap();
        assert!(trend.is_empty());
    }

    #[tokio::test]
    async fn test_days_grouped_and_ascending() {
        let db = MemoryDatabase::new();
        let project = db.seed_project(Uuid::new_v4(), "P", "example.com", "Example");
        let keyword = db.seed_keyword(&project, "cloud hosting");

        let now = Utc::now();
        // Two observations two days ago (one present), one yesterday (present).
        seed_at(&db, &keyword, now - Duration::days(2), true).await;
        seed_at(&db, &keyword, now - Duration::days(2), false).await;
        seed_at(&db, &keyword, now - Duration::days(1), true).await;

        let trend = get_trend_at(&db.store, project.id, now).await.unwrap();
        assert_eq!(trend.len(), 2);
        assert!(trend[0].day < trend[1].day);
        assert_eq!(trend[0].visibility, 50.0);
        assert_eq!(trend[1].visibility, 100.0);
    }

    #[tokio::test]
    async fn test_sparse_days_are_omitted() {
        let db = MemoryDatabase::new();
        let project = db.seed_project(Uuid::new_v4(), "P", "example.com", "Example");
        let keyword = db.seed_keyword(&project, "cloud hosting");

        let now = Utc::now();
        seed_at(&db, &keyword, now - Duration::days(10), true).await;
        seed_at(&db, &keyword, now - Duration::days(1), false).await;

        let trend = get_trend_at(&db.store, project.id, now).await.unwrap();
        // Only the two active days appear, not eight zero-filled ones.
        assert_eq!(trend.len(), 2);
    }

    #[tokio::test]
    async fn test_observations_older_than_window_excluded() {
        let db = MemoryDatabase::new();
        let project = db.seed_project(Uuid::new_v4(), "P", "example.com", "Example");
        let keyword = db.seed_keyword(&project, "cloud hosting");

        let now = Utc::now();
        seed_at(&db, &keyword, now - Duration::days(40), true).await;

        let trend = get_trend_at(&db.store, project.id, now).await.unwrap();
        assert!(trend.is_empty());
    }
}
