//! In-memory storage backend for hermetic tests and offline/demo mode.
//!
//! Implements the same contracts (and the same write-time invariants) as
//! the PostgreSQL repositories, backed by mutex-guarded collections. Used
//! by the test suites across the workspace and by the API server when
//! `AEVIS_STORE=memory`.
//!
//! ## Usage
//!
//! ```rust
//! use aevis_db::memory::MemoryDatabase;
//! use uuid::Uuid;
//!
//! let db = MemoryDatabase::new();
//! let owner = Uuid::new_v4();
//! let project = db.seed_project(owner, "Example AEO", "example.com", "Example");
//! let keyword = db.seed_keyword(&project, "cloud hosting");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use aevis_core::{
    Error, Keyword, KeywordRepository, NewObservation, Observation, ObservationFilter,
    ObservationStore, Project, ProjectRepository, Result,
};

/// In-memory implementation of [`ObservationStore`].
#[derive(Clone, Default)]
pub struct MemoryObservationStore {
    observations: Arc<Mutex<Vec<Observation>>>,
    keywords: Arc<Mutex<HashMap<Uuid, Keyword>>>,
}

impl MemoryObservationStore {
    pub fn new(keywords: Arc<Mutex<HashMap<Uuid, Keyword>>>) -> Self {
        Self {
            observations: Arc::new(Mutex::new(Vec::new())),
            keywords,
        }
    }

    /// Total number of stored observations (test assertion helper).
    pub fn len(&self) -> usize {
        self.observations.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObservationStore for MemoryObservationStore {
    async fn append_batch(&self, batch: Vec<NewObservation>) -> Result<Vec<Observation>> {
        let keywords = self.keywords.lock().unwrap().clone();

        // Validate the whole batch before touching the log: all-or-nothing.
        for draft in &batch {
            draft.validate()?;
            let keyword = keywords
                .get(&draft.keyword_id)
                .ok_or(Error::KeywordNotFound(draft.keyword_id))?;
            if draft.project_id != keyword.project_id
                || draft.owner_user_id != keyword.owner_user_id
            {
                return Err(Error::InvalidInput(format!(
                    "observation identity does not match keyword {}: denormalized \
                     project/owner must equal the keyword's",
                    draft.keyword_id
                )));
            }
        }

        let committed: Vec<Observation> = batch
            .into_iter()
            .map(NewObservation::into_observation)
            .collect();

        let mut log = self.observations.lock().unwrap();
        log.extend(committed.iter().cloned());
        Ok(committed)
    }

    async fn query(
        &self,
        project_id: Uuid,
        filter: ObservationFilter,
    ) -> Result<Vec<Observation>> {
        let log = self.observations.lock().unwrap();
        let mut hits: Vec<Observation> = log
            .iter()
            .filter(|o| o.project_id == project_id)
            .filter(|o| filter.keyword_id.map_or(true, |k| o.keyword_id == k))
            .filter(|o| {
                filter
                    .engine
                    .as_ref()
                    .map_or(true, |e| o.engine == e.as_str())
            })
            .filter(|o| filter.presence.map_or(true, |p| o.presence == p))
            .filter(|o| filter.since.map_or(true, |s| o.timestamp >= s))
            .filter(|o| filter.until.map_or(true, |u| o.timestamp < u))
            .cloned()
            .collect();

        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            hits.truncate(limit.max(0) as usize);
        }
        Ok(hits)
    }
}

/// In-memory implementation of [`ProjectRepository`].
#[derive(Clone, Default)]
pub struct MemoryProjectRepository {
    projects: Arc<Mutex<HashMap<Uuid, Project>>>,
}

#[async_trait]
impl ProjectRepository for MemoryProjectRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Project>> {
        Ok(self.projects.lock().unwrap().get(&id).cloned())
    }
}

/// In-memory implementation of [`KeywordRepository`].
#[derive(Clone, Default)]
pub struct MemoryKeywordRepository {
    keywords: Arc<Mutex<HashMap<Uuid, Keyword>>>,
}

#[async_trait]
impl KeywordRepository for MemoryKeywordRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Keyword>> {
        Ok(self.keywords.lock().unwrap().get(&id).cloned())
    }

    async fn count_for_project(&self, project_id: Uuid) -> Result<i64> {
        Ok(self
            .keywords
            .lock()
            .unwrap()
            .values()
            .filter(|k| k.project_id == project_id)
            .count() as i64)
    }
}

/// Bundled in-memory backend sharing one keyword table between the store
/// (for write-time invariant checks) and the keyword repository.
#[derive(Clone)]
pub struct MemoryDatabase {
    pub store: MemoryObservationStore,
    pub projects: MemoryProjectRepository,
    pub keywords: MemoryKeywordRepository,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        let keywords = Arc::new(Mutex::new(HashMap::new()));
        Self {
            store: MemoryObservationStore::new(keywords.clone()),
            projects: MemoryProjectRepository::default(),
            keywords: MemoryKeywordRepository { keywords },
        }
    }

    /// Insert a project record, standing in for the external CRUD
    /// collaborator.
    pub fn seed_project(
        &self,
        owner_user_id: Uuid,
        name: &str,
        domain: &str,
        brand_name: &str,
    ) -> Project {
        let project = Project {
            id: Uuid::new_v4(),
            owner_user_id,
            name: name.to_string(),
            domain: domain.to_string(),
            brand_name: brand_name.to_string(),
        };
        self.projects
            .projects
            .lock()
            .unwrap()
            .insert(project.id, project.clone());
        project
    }

    /// Insert a keyword under a project, inheriting its owner.
    pub fn seed_keyword(&self, project: &Project, text: &str) -> Keyword {
        let keyword = Keyword {
            id: Uuid::new_v4(),
            project_id: project.id,
            owner_user_id: project.owner_user_id,
            text: text.to_string(),
        };
        self.keywords
            .keywords
            .lock()
            .unwrap()
            .insert(keyword.id, keyword.clone());
        keyword
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}
