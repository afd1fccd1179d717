use anyhow::{bail, Result};
use chrono::Utc;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

use super::models::{Project, ProjectId, Task};
use crate::services::menu::ProjectStore;
use crate::utils::text::truncate_chars;

pub const DEFAULT_PROJECT_NAME: &str = "Untitled project";
pub const DEFAULT_TASK_STATUS: &str = "pending";

const MAX_DESCRIPTION_CHARS: usize = 2000;
const MAX_TITLE_CHARS: usize = 255;

static NUMBER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+").expect("valid regex"));

/// Project/task storage kept in process memory.
///
/// Ids are assigned in insertion order, so the highest id per admin is the
/// most recently created project.
#[derive(Default)]
pub struct InMemoryProjectStore {
    projects: DashMap<ProjectId, Project>,
    tasks: DashMap<ProjectId, Vec<Task>>,
    next_project_id: AtomicI64,
    next_task_id: AtomicI64,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn task_title(line: &str) -> String {
        let trimmed = line.trim();
        let title = NUMBER_PREFIX.replace(trimmed, "");
        truncate_chars(&title, MAX_TITLE_CHARS).to_string()
    }

    fn sanitize_description(description: Option<&str>) -> Option<String> {
        description.map(|text| truncate_chars(text, MAX_DESCRIPTION_CHARS).to_string())
    }
}

#[async_trait::async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn create_project_for_admin(
        &self,
        admin_id: i64,
        name: Option<String>,
        description: Option<String>,
        task_lines: &[String],
    ) -> Result<ProjectId> {
        if admin_id <= 0 {
            bail!("Invalid admin user id: {}", admin_id);
        }

        let id = self.next_project_id.fetch_add(1, Ordering::SeqCst) + 1;
        let name = name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PROJECT_NAME);

        self.projects.insert(
            id,
            Project {
                id,
                name: name.to_string(),
                description: Self::sanitize_description(description.as_deref()),
                created_by: admin_id,
                created_at: Utc::now(),
            },
        );

        let tasks: Vec<Task> = task_lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Task {
                id: self.next_task_id.fetch_add(1, Ordering::SeqCst) + 1,
                project_id: id,
                title: Self::task_title(line),
                description: line.trim().to_string(),
                status: DEFAULT_TASK_STATUS.to_string(),
            })
            .collect();

        debug!(
            "Stored project {} '{}' for admin {} with {} tasks",
            id,
            name,
            admin_id,
            tasks.len()
        );
        self.tasks.insert(id, tasks);

        Ok(id)
    }

    async fn projects_for_admin(&self, admin_id: i64) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|entry| entry.created_by == admin_id)
            .map(|entry| entry.value().clone())
            .collect();
        projects.sort_by_key(|project| project.id);
        Ok(projects)
    }

    async fn tasks_for_project(&self, project_id: ProjectId) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .get(&project_id)
            .map(|tasks| tasks.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_applies_defaults_and_caps() {
        let store = InMemoryProjectStore::new();
        let long_description = "x".repeat(2500);
        let long_task = format!("3. {}", "t".repeat(300));

        let id = store
            .create_project_for_admin(
                7,
                None,
                Some(long_description),
                &[
                    "1. Design schema".to_string(),
                    "   ".to_string(),
                    long_task,
                ],
            )
            .await
            .unwrap();

        let projects = store.projects_for_admin(7).await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, id);
        assert_eq!(projects[0].name, DEFAULT_PROJECT_NAME);
        assert_eq!(projects[0].description.as_ref().map(|d| d.len()), Some(2000));

        let tasks = store.tasks_for_project(id).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "Design schema");
        assert_eq!(tasks[0].description, "1. Design schema");
        assert_eq!(tasks[0].status, DEFAULT_TASK_STATUS);
        assert_eq!(tasks[1].title.len(), 255);
    }

    #[tokio::test]
    async fn test_projects_are_scoped_and_ordered() {
        let store = InMemoryProjectStore::new();
        let first = store
            .create_project_for_admin(1, Some("Alpha".into()), None, &[])
            .await
            .unwrap();
        store
            .create_project_for_admin(2, Some("Other".into()), None, &[])
            .await
            .unwrap();
        let second = store
            .create_project_for_admin(1, Some("Beta".into()), None, &[])
            .await
            .unwrap();

        let ids: Vec<_> = store
            .projects_for_admin(1)
            .await
            .unwrap()
            .iter()
            .map(|project| project.id)
            .collect();
        assert_eq!(ids, vec![first, second]);
        assert!(store.tasks_for_project(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_missing_admin() {
        let store = InMemoryProjectStore::new();
        assert!(store
            .create_project_for_admin(0, Some("Ghost".into()), None, &[])
            .await
            .is_err());
    }
}
