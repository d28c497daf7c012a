//! Aggregation behavior over seeded observation histories.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use aevis_analytics::{get_kpis_at, get_recommendations_at, RecommendationCaps};
use aevis_core::{EngineId, Keyword, NewObservation, ObservationStore, RecommendationKind};
use aevis_db::memory::MemoryDatabase;

struct Sample<'a> {
    engine: &'a str,
    presence: bool,
    urls: Vec<&'a str>,
}

async fn seed_run(db: &MemoryDatabase, keyword: &Keyword, at: DateTime<Utc>, samples: &[Sample<'_>]) {
    let drafts: Vec<NewObservation> = samples
        .iter()
        .map(|s| NewObservation {
            keyword_id: keyword.id,
            project_id: keyword.project_id,
            owner_user_id: keyword.owner_user_id,
            engine: EngineId::new(s.engine),
            presence: s.presence,
            position: s.presence.then_some(1),
            answer_snippet: String::new(),
            citations_count: if s.presence { s.urls.len().max(1) as i32 } else { 0 },
            observed_urls: s.urls.iter().map(|u| u.to_string()).collect(),
            timestamp: at,
        })
        .collect();
    db.store.append_batch(drafts).await.unwrap();
}

#[tokio::test]
async fn test_all_present_and_cited_is_all_clear() {
    let db = MemoryDatabase::new();
    let owner = Uuid::new_v4();
    let project = db.seed_project(owner, "Example AEO", "example.com", "Example");
    let keyword = db.seed_keyword(&project, "cloud hosting");

    let now = Utc::now();
    seed_run(
        &db,
        &keyword,
        now - Duration::minutes(10),
        &[
            Sample { engine: "Gemini", presence: true, urls: vec!["https://example.com/docs"] },
            Sample { engine: "Perplexity", presence: true, urls: vec!["example.com"] },
            Sample { engine: "ChatGPT", presence: true, urls: vec!["https://www.example.com/"] },
        ],
    )
    .await;

    let kpis = get_kpis_at(&db.store, &db.keywords, project.id, now)
        .await
        .unwrap();
    assert_eq!(kpis.visibility_score, 100.0);
    assert_eq!(kpis.total_keywords, 1);
    assert_eq!(kpis.engines_covered, 3);

    let recs = get_recommendations_at(
        &db.store,
        &db.keywords,
        &db.projects,
        project.id,
        RecommendationCaps::default(),
        now,
    )
    .await
    .unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].id, "placeholder-1");
    assert!(recs[0].message.contains("strong visibility"));
}

#[tokio::test]
async fn test_one_missing_two_uncited() {
    let db = MemoryDatabase::new();
    let owner = Uuid::new_v4();
    let project = db.seed_project(owner, "Example AEO", "example.com", "Example");
    let keyword = db.seed_keyword(&project, "cloud hosting");

    let now = Utc::now();
    seed_run(
        &db,
        &keyword,
        now - Duration::minutes(10),
        &[
            Sample { engine: "Gemini", presence: false, urls: vec![] },
            Sample { engine: "Perplexity", presence: true, urls: vec!["othersite.example"] },
            Sample { engine: "ChatGPT", presence: true, urls: vec!["review-hub.example"] },
        ],
    )
    .await;

    let kpis = get_kpis_at(&db.store, &db.keywords, project.id, now)
        .await
        .unwrap();
    assert!((kpis.visibility_score - 200.0 / 3.0).abs() < 0.1);

    let recs = get_recommendations_at(
        &db.store,
        &db.keywords,
        &db.projects,
        project.id,
        RecommendationCaps::default(),
        now,
    )
    .await
    .unwrap();

    assert_eq!(recs.len(), 3);
    // Missing bucket first, then uncited.
    assert_eq!(recs[0].kind, RecommendationKind::Missing);
    assert_eq!(recs[0].id, format!("miss-{}-Gemini", keyword.id));
    assert!(recs[0].message.contains("cloud hosting"));
    assert_eq!(recs[1].kind, RecommendationKind::Uncited);
    assert_eq!(recs[2].kind, RecommendationKind::Uncited);
    let uncited_ids: Vec<&str> = recs[1..].iter().map(|r| r.id.as_str()).collect();
    assert!(uncited_ids.contains(&format!("cite-{}-Perplexity", keyword.id).as_str()));
    assert!(uncited_ids.contains(&format!("cite-{}-ChatGPT", keyword.id).as_str()));
}

#[tokio::test]
async fn test_recommendations_are_idempotent() {
    let db = MemoryDatabase::new();
    let owner = Uuid::new_v4();
    let project = db.seed_project(owner, "Example AEO", "example.com", "Example");
    let keyword = db.seed_keyword(&project, "cloud hosting");

    let now = Utc::now();
    seed_run(
        &db,
        &keyword,
        now - Duration::minutes(10),
        &[
            Sample { engine: "Gemini", presence: false, urls: vec![] },
            Sample { engine: "Perplexity", presence: true, urls: vec!["othersite.example"] },
        ],
    )
    .await;

    let first = get_recommendations_at(
        &db.store,
        &db.keywords,
        &db.projects,
        project.id,
        RecommendationCaps::default(),
        now,
    )
    .await
    .unwrap();
    let second = get_recommendations_at(
        &db.store,
        &db.keywords,
        &db.projects,
        project.id,
        RecommendationCaps::default(),
        now,
    )
    .await
    .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_scan_cap_bounds_output() {
    let db = MemoryDatabase::new();
    let owner = Uuid::new_v4();
    let project = db.seed_project(owner, "Example AEO", "example.com", "Example");

    let now = Utc::now();
    // Eight different keywords, all missing on one engine.
    for i in 0..8i64 {
        let keyword = db.seed_keyword(&project, &format!("keyword {}", i));
        seed_run(
            &db,
            &keyword,
            now - Duration::minutes(i),
            &[Sample { engine: "Gemini", presence: false, urls: vec![] }],
        )
        .await;
    }

    let recs = get_recommendations_at(
        &db.store,
        &db.keywords,
        &db.projects,
        project.id,
        RecommendationCaps::default(),
        now,
    )
    .await
    .unwrap();
    assert_eq!(recs.len(), 5);
    assert!(recs.iter().all(|r| r.kind == RecommendationKind::Missing));
    // Most recent absences first.
    assert!(recs[0].message.contains("keyword 0"));
}

#[tokio::test]
async fn test_repeat_observations_dedup_to_one_recommendation() {
    let db = MemoryDatabase::new();
    let owner = Uuid::new_v4();
    let project = db.seed_project(owner, "Example AEO", "example.com", "Example");
    let keyword = db.seed_keyword(&project, "cloud hosting");

    let now = Utc::now();
    // Same keyword absent on the same engine in three separate runs.
    for i in 0..3i64 {
        seed_run(
            &db,
            &keyword,
            now - Duration::minutes(i),
            &[Sample { engine: "Gemini", presence: false, urls: vec![] }],
        )
        .await;
    }

    let recs = get_recommendations_at(
        &db.store,
        &db.keywords,
        &db.projects,
        project.id,
        RecommendationCaps::default(),
        now,
    )
    .await
    .unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].id, format!("miss-{}-Gemini", keyword.id));
}

#[tokio::test]
async fn test_degraded_observations_count_as_missing() {
    let db = MemoryDatabase::new();
    let owner = Uuid::new_v4();
    let project = db.seed_project(owner, "Example AEO", "example.com", "Example");
    let keyword = db.seed_keyword(&project, "cloud hosting");

    let now = Utc::now();
    let draft = NewObservation {
        keyword_id: keyword.id,
        project_id: keyword.project_id,
        owner_user_id: keyword.owner_user_id,
        engine: EngineId::new("Gemini"),
        presence: false,
        position: None,
        answer_snippet: "[engine unavailable] Gemini: timed out after 30s".to_string(),
        citations_count: 0,
        observed_urls: Vec::new(),
        timestamp: now - Duration::minutes(1),
    };
    db.store.append_batch(vec![draft]).await.unwrap();

    let recs = get_recommendations_at(
        &db.store,
        &db.keywords,
        &db.projects,
        project.id,
        RecommendationCaps::default(),
        now,
    )
    .await
    .unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].kind, RecommendationKind::Missing);
}
