//! Heuristic recommendation rules.
//!
//! Two rules scan the trailing 24 hours of observations: "missing" flags
//! keywords absent on an engine, "uncited" flags keywords where the brand
//! appeared but the tracked domain was not among the cited URLs. Output is
//! bucketed, missing first, and falls back to a single all-clear entry
//! when both rules come up empty.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use aevis_core::{
    defaults, Error, KeywordRepository, ObservationFilter, ObservationStore, ProjectRepository,
    Recommendation, RecommendationKind, Result,
};

/// Scan caps per rule. The caps bound work and output size, not accuracy;
/// recommendations are best-effort by design.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationCaps {
    pub missing: i64,
    pub uncited: i64,
}

impl Default for RecommendationCaps {
    fn default() -> Self {
        Self {
            missing: defaults::RECO_MISSING_SCAN_CAP,
            uncited: defaults::RECO_UNCITED_SCAN_CAP,
        }
    }
}

/// Recommendations for a project over the trailing 24 hours ending now.
pub async fn get_recommendations(
    store: &dyn ObservationStore,
    keywords: &dyn KeywordRepository,
    projects: &dyn ProjectRepository,
    project_id: Uuid,
) -> Result<Vec<Recommendation>> {
    get_recommendations_at(
        store,
        keywords,
        projects,
        project_id,
        RecommendationCaps::default(),
        Utc::now(),
    )
    .await
}

/// Recommendations with explicit caps and query time.
pub async fn get_recommendations_at(
    store: &dyn ObservationStore,
    keywords: &dyn KeywordRepository,
    projects: &dyn ProjectRepository,
    project_id: Uuid,
    caps: RecommendationCaps,
    now: DateTime<Utc>,
) -> Result<Vec<Recommendation>> {
    let project = projects
        .get(project_id)
        .await?
        .ok_or(Error::ProjectNotFound(project_id))?;
    let domain = normalize_domain(&project.domain);

    let window = Duration::hours(defaults::KPI_WINDOW_HOURS);
    let mut recommendations = Vec::new();
    let mut seen: HashSet<(Uuid, String, RecommendationKind)> = HashSet::new();
    let mut keyword_texts: HashMap<Uuid, String> = HashMap::new();

    // Rule "missing": most recent absences first.
    let missing = store
        .query(
            project_id,
            ObservationFilter::trailing(window, now)
                .with_presence(false)
                .with_limit(caps.missing),
        )
        .await?;
    for observation in &missing {
        if !seen.insert((
            observation.keyword_id,
            observation.engine.clone(),
            RecommendationKind::Missing,
        )) {
            continue;
        }
        let text =
            keyword_text(keywords, &mut keyword_texts, observation.keyword_id).await?;
        recommendations.push(Recommendation {
            id: format!("miss-{}-{}", observation.keyword_id, observation.engine),
            message: format!(
                "Your brand is missing on {} for the keyword: \"{}\"",
                observation.engine, text
            ),
            kind: RecommendationKind::Missing,
        });
    }

    // Rule "uncited": present but the tracked domain never shows up in the
    // observed URLs.
    let present = store
        .query(
            project_id,
            ObservationFilter::trailing(window, now)
                .with_presence(true)
                .with_limit(caps.uncited),
        )
        .await?;
    for observation in &present {
        let cited = observation
            .observed_urls
            .iter()
            .any(|url| normalize_domain(url).contains(&domain));
        if cited {
            continue;
        }
        if !seen.insert((
            observation.keyword_id,
            observation.engine.clone(),
            RecommendationKind::Uncited,
        )) {
            continue;
        }
        let text =
            keyword_text(keywords, &mut keyword_texts, observation.keyword_id).await?;
        recommendations.push(Recommendation {
            id: format!("cite-{}-{}", observation.keyword_id, observation.engine),
            message: format!(
                "You are present on {} for \"{}\" but your domain was not cited.",
                observation.engine, text
            ),
            kind: RecommendationKind::Uncited,
        });
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation {
            id: "placeholder-1".to_string(),
            message: "Great job! Your brand has strong visibility across all AI engines. \
                      Keep monitoring for changes."
                .to_string(),
            kind: RecommendationKind::Uncited,
        });
    }

    debug!(
        subsystem = "analytics",
        op = "get_recommendations",
        %project_id,
        recommendation_count = recommendations.len(),
        "Computed recommendations"
    );

    Ok(recommendations)
}

async fn keyword_text(
    keywords: &dyn KeywordRepository,
    cache: &mut HashMap<Uuid, String>,
    keyword_id: Uuid,
) -> Result<String> {
    if let Some(text) = cache.get(&keyword_id) {
        return Ok(text.clone());
    }
    // A keyword deleted after its observations were written still gets a
    // recommendation, just without its text.
    let text = keywords
        .get(keyword_id)
        .await?
        .map(|k| k.text)
        .unwrap_or_else(|| "Unknown".to_string());
    cache.insert(keyword_id, text.clone());
    Ok(text)
}

/// Normalize a domain or URL for substring matching: lowercase, scheme and
/// `www.` prefix stripped, trailing slash removed.
pub fn normalize_domain(raw: &str) -> String {
    let mut s = raw.trim().to_ascii_lowercase();
    for prefix in ["https://", "http://"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.to_string();
            break;
        }
    }
    if let Some(rest) = s.strip_prefix("www.") {
        s = rest.to_string();
    }
    s.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain_strips_scheme_and_www() {
        assert_eq!(normalize_domain("https://www.Example.com/"), "example.com");
        assert_eq!(normalize_domain("http://example.com"), "example.com");
        assert_eq!(normalize_domain("example.com"), "example.com");
    }

    #[test]
    fn test_normalized_url_contains_domain() {
        let domain = normalize_domain("example.com");
        assert!(normalize_domain("https://example.com/pricing").contains(&domain));
        assert!(!normalize_domain("https://othersite.example").contains(&domain));
    }

    #[test]
    fn test_default_caps() {
        let caps = RecommendationCaps::default();
        assert_eq!(caps.missing, 5);
        assert_eq!(caps.uncited, 10);
    }
}
