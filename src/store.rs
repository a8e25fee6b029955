use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ai::AiResponse;
use crate::core::plan::WeeklyPlan;
use crate::core::task::{Task, TaskPatch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("document serialization: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("task {0} not found")]
    TaskNotFound(Uuid),
    #[error("no task matches {0:?}")]
    UnknownTask(String),
    #[error("{0:?} matches more than one task")]
    AmbiguousTask(String),
    #[error("no fields to update")]
    NoFieldsToUpdate,
}

/// Whether an edit changed the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlan {
    pub id: Uuid,
    pub plan: WeeklyPlan,
}

impl StoredPlan {
    fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            plan: WeeklyPlan::default(),
        }
    }
}

/// Everything the user has organized so far. Timestamps are epoch millis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDocument {
    pub id: Uuid,
    pub created_at: i64,
    pub updated_at: i64,
    pub tasks: Vec<Task>,
    pub weekly_plan: StoredPlan,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl Default for StorageDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageDocument {
    pub fn new() -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            tasks: Vec::new(),
            weekly_plan: StoredPlan::empty(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = now_millis().max(self.updated_at);
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn plan(&self) -> &WeeklyPlan {
        &self.weekly_plan.plan
    }

    /// Resolve a full id or a unique prefix of one.
    pub fn find_task_id(&self, needle: &str) -> Result<Uuid, StoreError> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return Err(StoreError::UnknownTask(needle));
        }
        let mut matches = self
            .tasks
            .iter()
            .filter(|t| t.id.to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task.id),
            (Some(_), Some(_)) => Err(StoreError::AmbiguousTask(needle)),
            (None, _) => Err(StoreError::UnknownTask(needle)),
        }
    }

    /// Add the extracted tasks and append the extracted plan to the current
    /// one. Returns the number of tasks added.
    pub fn apply_response(&mut self, response: AiResponse) -> usize {
        let added = response.tasks.len();
        self.tasks
            .extend(response.tasks.into_iter().map(Task::from_extracted));

        let mut plan = std::mem::take(&mut self.weekly_plan.plan);
        plan.append(response.weekly_plan);
        self.weekly_plan = StoredPlan {
            id: Uuid::new_v4(),
            plan,
        };

        self.touch();
        log::info!("Brain dump processed: {} tasks added", added);
        added
    }

    pub fn update_task(&mut self, patch: &TaskPatch) -> Result<Outcome, StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == patch.id)
            .ok_or(StoreError::TaskNotFound(patch.id))?;
        if patch.is_empty() {
            return Err(StoreError::NoFieldsToUpdate);
        }

        let mut updated = task.clone();
        patch.apply(&mut updated);
        if updated == *task {
            log::debug!("Task {} is unchanged, no updates made", patch.id);
            return Ok(Outcome::Unchanged);
        }

        *task = updated;
        self.touch();
        Ok(Outcome::Updated)
    }

    pub fn set_completed(&mut self, id: Uuid, completed: bool) -> Result<Outcome, StoreError> {
        self.update_task(&TaskPatch::new(id).completed(completed))
    }

    /// Remove a task along with the plan entries scheduled for it (same text
    /// and an end matching the task's deadline).
    pub fn delete_task(&mut self, id: Uuid) -> Result<Task, StoreError> {
        let pos = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::TaskNotFound(id))?;
        let task = self.tasks.remove(pos);

        self.weekly_plan.plan.retain(|entry| {
            entry.task != task.title || task.deadline.as_deref() != Some(entry.end.as_str())
        });

        self.touch();
        log::info!("Deleted task {}", task.id);
        Ok(task)
    }

    pub fn delete_done_tasks(&mut self) -> Outcome {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        if self.tasks.len() == before {
            return Outcome::Unchanged;
        }
        self.touch();
        log::info!("Deleted {} done tasks", before - self.tasks.len());
        Outcome::Updated
    }

    pub fn clear_all(&mut self) {
        self.tasks.clear();
        self.weekly_plan = StoredPlan::empty();
        self.touch();
        log::info!("All data cleared");
    }
}

/// A [`StorageDocument`] bound to its JSON file.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    document: StorageDocument,
}

impl DocumentStore {
    /// Load the document at `path`, or start a fresh one if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let document = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Initialized new document at {}", path.display());
                StorageDocument::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &StorageDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut StorageDocument {
        &mut self.document
    }

    /// Write through a temp file so a crash never leaves half a document.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.document)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        log::debug!("Saved document to {}", self.path.display());
        Ok(())
    }
}
