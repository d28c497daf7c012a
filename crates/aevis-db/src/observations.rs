//! Observation store implementation (append-only log).

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use aevis_core::{
    Error, NewObservation, Observation, ObservationFilter, ObservationStore, Result,
};

/// PostgreSQL implementation of [`ObservationStore`].
#[derive(Clone)]
pub struct PgObservationStore {
    pool: Pool<Postgres>,
}

impl PgObservationStore {
    /// Create a new PgObservationStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Append the filter's WHERE fragments, numbering bind parameters as they
/// are added.
fn add_filter_clauses(query: &mut String, param_idx: &mut usize, filter: &ObservationFilter) {
    if filter.keyword_id.is_some() {
        query.push_str(&format!("AND keyword_id = ${} ", param_idx));
        *param_idx += 1;
    }
    if filter.engine.is_some() {
        query.push_str(&format!("AND engine = ${} ", param_idx));
        *param_idx += 1;
    }
    if filter.presence.is_some() {
        query.push_str(&format!("AND presence = ${} ", param_idx));
        *param_idx += 1;
    }
    if filter.since.is_some() {
        query.push_str(&format!("AND timestamp >= ${} ", param_idx));
        *param_idx += 1;
    }
    if filter.until.is_some() {
        query.push_str(&format!("AND timestamp < ${} ", param_idx));
        *param_idx += 1;
    }
}

fn map_row_to_observation(row: sqlx::postgres::PgRow) -> Observation {
    Observation {
        id: row.get("id"),
        keyword_id: row.get("keyword_id"),
        project_id: row.get("project_id"),
        owner_user_id: row.get("owner_user_id"),
        engine: row.get("engine"),
        presence: row.get("presence"),
        position: row.get("position"),
        answer_snippet: row.get("answer_snippet"),
        citations_count: row.get("citations_count"),
        observed_urls: row.get("observed_urls"),
        timestamp: row.get("timestamp"),
    }
}

#[async_trait]
impl ObservationStore for PgObservationStore {
    #[instrument(skip(self, batch), fields(subsystem = "db", component = "observations", op = "append_batch"))]
    async fn append_batch(&self, batch: Vec<NewObservation>) -> Result<Vec<Observation>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Keyword identity rows, fetched once per distinct keyword in the
        // batch and checked against every draft's denormalized copies.
        let mut keyword_identity: HashMap<Uuid, (Uuid, Uuid)> = HashMap::new();

        let mut committed = Vec::with_capacity(batch.len());
        for draft in batch {
            draft.validate()?;

            let (project_id, owner_user_id) = match keyword_identity.get(&draft.keyword_id) {
                Some(identity) => *identity,
                None => {
                    let row = sqlx::query(
                        "SELECT project_id, owner_user_id FROM keywords WHERE id = $1",
                    )
                    .bind(draft.keyword_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(Error::Database)?
                    .ok_or(Error::KeywordNotFound(draft.keyword_id))?;

                    let identity: (Uuid, Uuid) =
                        (row.get("project_id"), row.get("owner_user_id"));
                    keyword_identity.insert(draft.keyword_id, identity);
                    identity
                }
            };

            if draft.project_id != project_id || draft.owner_user_id != owner_user_id {
                return Err(Error::InvalidInput(format!(
                    "observation identity does not match keyword {}: denormalized \
                     project/owner must equal the keyword's",
                    draft.keyword_id
                )));
            }

            let obs = draft.into_observation();
            sqlx::query(
                "INSERT INTO observations \
                 (id, keyword_id, project_id, owner_user_id, engine, presence, position, \
                  answer_snippet, citations_count, observed_urls, timestamp) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(obs.id)
            .bind(obs.keyword_id)
            .bind(obs.project_id)
            .bind(obs.owner_user_id)
            .bind(&obs.engine)
            .bind(obs.presence)
            .bind(obs.position)
            .bind(&obs.answer_snippet)
            .bind(obs.citations_count)
            .bind(&obs.observed_urls)
            .bind(obs.timestamp)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

            committed.push(obs);
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "observations",
            op = "append_batch",
            observation_count = committed.len(),
            "Committed observation batch"
        );
        Ok(committed)
    }

    #[instrument(skip(self, filter), fields(subsystem = "db", component = "observations", op = "query"))]
    async fn query(
        &self,
        project_id: Uuid,
        filter: ObservationFilter,
    ) -> Result<Vec<Observation>> {
        let mut sql = String::from(
            "SELECT id, keyword_id, project_id, owner_user_id, engine, presence, position, \
             answer_snippet, citations_count, observed_urls, timestamp \
             FROM observations WHERE project_id = $1 ",
        );

        let mut param_idx = 2;
        add_filter_clauses(&mut sql, &mut param_idx, &filter);
        sql.push_str("ORDER BY timestamp DESC ");
        if filter.limit.is_some() {
            sql.push_str(&format!("LIMIT ${}", param_idx));
        }

        let mut query = sqlx::query(&sql).bind(project_id);
        if let Some(keyword_id) = filter.keyword_id {
            query = query.bind(keyword_id);
        }
        if let Some(engine) = &filter.engine {
            query = query.bind(engine.as_str().to_string());
        }
        if let Some(presence) = filter.presence {
            query = query.bind(presence);
        }
        if let Some(since) = filter.since {
            query = query.bind(since);
        }
        if let Some(until) = filter.until {
            query = query.bind(until);
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_observation).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aevis_core::EngineId;
    use chrono::Utc;

    #[test]
    fn test_filter_clause_numbering_all_fields() {
        let filter = ObservationFilter {
            keyword_id: Some(Uuid::new_v4()),
            engine: Some(EngineId::new("Gemini")),
            presence: Some(true),
            since: Some(Utc::now()),
            until: Some(Utc::now()),
            limit: Some(10),
        };

        let mut sql = String::new();
        let mut idx = 2;
        add_filter_clauses(&mut sql, &mut idx, &filter);

        assert!(sql.contains("keyword_id = $2"));
        assert!(sql.contains("engine = $3"));
        assert!(sql.contains("presence = $4"));
        assert!(sql.contains("timestamp >= $5"));
        assert!(sql.contains("timestamp < $6"));
        assert_eq!(idx, 7, "limit binds as the next parameter");
    }

    #[test]
    fn test_filter_clause_numbering_sparse() {
        let filter = ObservationFilter::default().with_presence(false);

        let mut sql = String::new();
        let mut idx = 2;
        add_filter_clauses(&mut sql, &mut idx, &filter);

        assert_eq!(sql.trim(), "AND presence = $2");
        assert_eq!(idx, 3);
    }
}
