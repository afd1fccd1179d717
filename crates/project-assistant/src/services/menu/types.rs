use serde::Serialize;
use std::collections::HashSet;
use tokio::time::Instant;

use crate::collections::{CollectionError, LinkedList, Queue, Trie};
use crate::utils::text::{letter_tokens, normalize_whitespace};

pub type SessionId = String;

/// Where a session stands in the menu flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    New,
    AwaitingIdea,
    HasProjectNoTasks,
    HasProjectWithTasks,
    Terminated,
}

/// Result of marking a task number as done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Completed { number: usize, task: String },
    AlreadyCompleted { number: usize },
    OutOfRange { number: usize, total: usize },
    NoTasks,
}

/// Completed/total counts with the percentage done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        }
    }

    pub fn pending(&self) -> usize {
        self.total.saturating_sub(self.completed)
    }
}

/// All state for one conversational session
#[derive(Debug)]
pub struct SessionState {
    pub session_id: SessionId,
    pub active: bool,
    pub phase: SessionPhase,
    pub interactions: u64,

    /// Raw generated text of the last project creation
    pub context: Option<String>,
    pub project_name: Option<String>,
    /// Renumbered task lines, `"1. ...\n2. ..."`
    pub task_block: String,

    pub tasks: LinkedList<String>,
    /// 1-based task numbers
    pub completed: HashSet<usize>,
    pub trie: Trie,
    pub pending: Queue<String>,

    /// Last project established here, for relationship chaining
    pub last_project: Option<String>,
    pub admin_user_id: Option<i64>,

    pub created_at: Instant,
    pub last_activity: Instant,
    pub exited_at: Option<Instant>,
}

impl SessionState {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        let now = Instant::now();
        Self {
            session_id: session_id.into(),
            active: true,
            phase: SessionPhase::New,
            interactions: 0,
            context: None,
            project_name: None,
            task_block: String::new(),
            tasks: LinkedList::new(),
            completed: HashSet::new(),
            trie: Trie::new(),
            pending: Queue::new(),
            last_project: None,
            admin_user_id: None,
            created_at: now,
            last_activity: now,
            exited_at: None,
        }
    }

    /// Count one processed action
    pub fn touch(&mut self) {
        self.interactions += 1;
        self.last_activity = Instant::now();
    }

    pub fn has_project(&self) -> bool {
        self.project_name.is_some() || self.context.is_some()
    }

    pub fn display_name(&self) -> &str {
        self.project_name
            .as_deref()
            .unwrap_or("Previously defined project")
    }

    /// Overwrite the active project with a freshly generated one.
    ///
    /// Tasks, completions, the task index and the task block all belong to the
    /// old project and are dropped. Returns the replaced project name when a
    /// project was already active.
    pub fn replace_project_context(
        &mut self,
        context: Option<String>,
        project_name: Option<String>,
    ) -> Option<String> {
        let had_project = self.has_project();
        let previous = self.project_name.take();

        self.context = context;
        self.project_name = project_name;
        self.task_block.clear();
        self.tasks.clear();
        self.completed.clear();
        self.trie = Trie::new();
        self.pending = Queue::new();
        self.refresh_phase();

        if had_project {
            Some(previous.unwrap_or_else(|| "(unnamed)".to_string()))
        } else {
            None
        }
    }

    /// Queue task descriptions and drain them in FIFO order into the list,
    /// the trie and the task block. Blank and repeated descriptions are
    /// skipped. Returns how many tasks were added.
    pub fn ingest_tasks<I>(&mut self, descriptions: I) -> Result<usize, CollectionError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut seen = HashSet::new();
        for description in descriptions {
            let task = normalize_whitespace(description.as_ref());
            if !task.is_empty() && seen.insert(task.clone()) {
                self.pending.enqueue(task);
            }
        }

        let mut added = 0;
        while !self.pending.is_empty() {
            let task = self.pending.dequeue()?;
            for token in letter_tokens(&task) {
                self.trie.insert(&token);
            }

            if !self.task_block.is_empty() {
                self.task_block.push('\n');
            }
            self.task_block
                .push_str(&format!("{}. {}", self.tasks.len() + 1, task));
            self.tasks.append(task);
            added += 1;
        }

        self.refresh_phase();
        Ok(added)
    }

    /// Mark task `number` (1-based) as completed
    pub fn complete_task(&mut self, number: usize) -> Result<Completion, CollectionError> {
        let total = self.tasks.len();
        if total == 0 {
            return Ok(Completion::NoTasks);
        }
        if number == 0 || number > total {
            return Ok(Completion::OutOfRange { number, total });
        }
        if self.completed.contains(&number) {
            return Ok(Completion::AlreadyCompleted { number });
        }

        let task = self.tasks.get(number - 1)?.clone();
        self.completed.insert(number);
        Ok(Completion::Completed { number, task })
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.completed.len(),
            total: self.tasks.len(),
        }
    }

    pub fn mark_exited(&mut self) {
        self.active = false;
        self.phase = SessionPhase::Terminated;
        self.exited_at = Some(Instant::now());
    }

    fn refresh_phase(&mut self) {
        if self.phase == SessionPhase::Terminated {
            return;
        }
        self.phase = if !self.tasks.is_empty() {
            SessionPhase::HasProjectWithTasks
        } else if self.has_project() {
            SessionPhase::HasProjectNoTasks
        } else {
            SessionPhase::New
        };
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut completed: Vec<usize> = self.completed.iter().copied().collect();
        completed.sort_unstable();

        SessionSnapshot {
            session_id: self.session_id.clone(),
            active: self.active,
            phase: self.phase,
            interactions: self.interactions,
            project_name: self.project_name.clone(),
            tasks: self.tasks.iter().cloned().collect(),
            completed,
            task_block: self.task_block.clone(),
        }
    }
}

/// Read-only copy of a session for callers and tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub active: bool,
    pub phase: SessionPhase,
    pub interactions: u64,
    pub project_name: Option<String>,
    pub tasks: Vec<String>,
    pub completed: Vec<usize>,
    pub task_block: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_project(tasks: &[&str]) -> SessionState {
        let mut state = SessionState::new("s1");
        state.replace_project_context(Some("ctx".into()), Some("Recipe Hub".into()));
        state.ingest_tasks(tasks.iter().copied()).unwrap();
        state
    }

    #[test]
    fn test_ingest_renumbers_and_indexes() {
        let state = with_project(&["Design  schema", "Build API", "Design schema", "  "]);

        assert_eq!(state.tasks.len(), 2);
        assert_eq!(state.task_block, "1. Design schema\n2. Build API");
        assert!(state.trie.search("schema"));
        assert!(state.trie.search("api"));
        assert!(state.pending.is_empty());
        assert_eq!(state.phase, SessionPhase::HasProjectWithTasks);
    }

    #[test]
    fn test_completion_is_idempotent() {
        let mut state = with_project(&["a task", "b task", "c task"]);

        assert_eq!(
            state.complete_task(2).unwrap(),
            Completion::Completed {
                number: 2,
                task: "b task".into()
            }
        );
        assert_eq!(
            state.complete_task(2).unwrap(),
            Completion::AlreadyCompleted { number: 2 }
        );
        assert_eq!(
            state.complete_task(4).unwrap(),
            Completion::OutOfRange { number: 4, total: 3 }
        );
        assert_eq!(
            state.complete_task(0).unwrap(),
            Completion::OutOfRange { number: 0, total: 3 }
        );

        let progress = state.progress();
        assert_eq!((progress.completed, progress.total), (1, 3));
        assert_eq!(progress.pending(), 2);
    }

    #[test]
    fn test_replace_drops_old_project() {
        let mut state = with_project(&["old task"]);
        state.complete_task(1).unwrap();

        let replaced = state.replace_project_context(Some("new".into()), Some("Next".into()));
        assert_eq!(replaced.as_deref(), Some("Recipe Hub"));
        assert!(state.tasks.is_empty());
        assert!(state.completed.is_empty());
        assert!(!state.trie.search("old"));
        assert_eq!(state.phase, SessionPhase::HasProjectNoTasks);
    }

    #[test]
    fn test_first_project_replaces_nothing() {
        let mut state = SessionState::new("s1");
        assert_eq!(state.replace_project_context(None, Some("First".into())), None);
        assert_eq!(state.complete_task(1).unwrap(), Completion::NoTasks);
    }

    #[test]
    fn test_exit_marks_terminated() {
        let mut state = with_project(&["task"]);
        state.mark_exited();
        assert!(!state.active);
        assert!(state.exited_at.is_some());
        assert_eq!(state.snapshot().phase, SessionPhase::Terminated);
    }
}
