/// manager.rs
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::database::{Project, ProjectId, Task};
use crate::logging::{ActivityLog, ActivityLogger, ActivityStatus, ActivityType};
use crate::models::menu::{MenuOption, MenuReply, MenuResponse};
use crate::utils::error::{looks_like_failure, GenerationError};
use crate::utils::text::normalize_whitespace;

use super::extraction::{derive_name_from_idea, extract_project_name, extract_tasks};
use super::project_index::ProjectIndex;
use super::store::{SessionHandle, SessionStore};
use super::types::{Completion, Progress, SessionPhase, SessionSnapshot, SessionState};

const MENU_TITLE: &str = "Main Menu - Project Management";
const INVALID_OPTION: &str = "Invalid option. Please choose an option from 1 to 4.";
const INTERNAL_ERROR: &str = "Something went wrong while processing your request. Please try again.";
const SUGGEST_PREFIX: &str = "suggest:";

const IDEA_PROMPT: &str = "CREATE A NEW PROJECT\n\n\
    Let's build a new project together.\n\n\
    To get started, tell me:\n\
    - What is your project idea?\n\
    - What problem do you want to solve?\n\
    - What kind of project do you have in mind?\n\n\
    Type your project idea and I'll turn it into a full plan.";

const NO_PROJECT: &str = "Error: no project is defined in this session.\n\n\
    Choose option 1 to create a project first.";

const NO_PROJECT_FOR_TASKS: &str = "TASK MANAGEMENT\n\n\
    No project is defined in this session.\n\n\
    To manage tasks:\n\
    1. Choose option 1 to create a project first\n\
    2. The assistant generates the initial tasks\n\
    3. Come back here to add more tasks";

const NO_TASKS: &str = "Error: no tasks are defined in this session.\n\n\
    Create tasks with option 1 or option 2 first.";

const INVALID_TASK_NUMBER: &str = "Error: please enter a valid task number.\n\n\
    Example: type \"3\" to mark task #3 as completed.";

/// Text-generation backend used to develop project ideas
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String, GenerationError>;
}

/// Durable storage for projects and their tasks
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create_project_for_admin(
        &self,
        admin_id: i64,
        name: Option<String>,
        description: Option<String>,
        task_lines: &[String],
    ) -> Result<ProjectId>;

    /// Projects created by `admin_id`, oldest first
    async fn projects_for_admin(&self, admin_id: i64) -> Result<Vec<Project>>;

    async fn tasks_for_project(&self, project_id: ProjectId) -> Result<Vec<Task>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    CreateProject,
    ManageTasks,
    ConsultTasks,
    Exit,
}

impl MenuAction {
    fn from_option(option: i64) -> Option<Self> {
        match option {
            1 => Some(Self::CreateProject),
            2 => Some(Self::ManageTasks),
            3 => Some(Self::ConsultTasks),
            4 => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Outcome of a generation attempt, after in-band failure sniffing
struct Generation {
    text: Option<String>,
    failure: Option<(&'static str, String)>,
}

/// Conversational menu engine.
///
/// Each call resolves the session through the store and holds its lock for the
/// whole action, so requests for one session run one at a time.
pub struct MenuManager {
    sessions: Arc<dyn SessionStore>,
    index: ProjectIndex,
    generator: Arc<dyn TextGenerator>,
    projects: Arc<dyn ProjectStore>,
    logger: ActivityLogger,
    prompt_template: String,
    max_tokens: usize,
}

impl MenuManager {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        generator: Arc<dyn TextGenerator>,
        projects: Arc<dyn ProjectStore>,
        logger: ActivityLogger,
        prompt_template: impl Into<String>,
        max_tokens: usize,
    ) -> Self {
        Self {
            sessions,
            index: ProjectIndex::new(),
            generator,
            projects,
            logger,
            prompt_template: prompt_template.into(),
            max_tokens,
        }
    }

    fn session(&self, session_id: &str) -> SessionHandle {
        let (handle, created) = self.sessions.get_or_create(session_id);
        if created {
            info!("New menu session {}", session_id);
            self.logger
                .log(ActivityLog::builder(session_id, ActivityType::SessionCreated).build());
        }
        handle
    }

    /// Main menu for `session_id`, registering the session when new
    pub async fn menu_options(&self, session_id: &str) -> MenuResponse {
        let active = self.session(session_id).lock().await.active;

        MenuResponse {
            title: MENU_TITLE.to_string(),
            options: vec![
                MenuOption::new(1, "Create a project", "create_project"),
                MenuOption::new(2, "Manage project tasks", "manage_tasks"),
                MenuOption::new(3, "Consult and complete tasks", "consult_tasks"),
                MenuOption::new(4, "Exit", "exit"),
            ],
            status: if active { "active" } else { "ended" }.to_string(),
        }
    }

    /// Run one menu action for a session.
    ///
    /// Invalid options and inputs come back as reply text; only internal
    /// failures are logged and replaced with a generic message.
    pub async fn process_option(&self, option: i64, session_id: &str, input: Option<&str>) -> MenuReply {
        let started = Instant::now();
        let handle = self.session(session_id);
        let mut state = handle.lock().await;
        state.touch();

        let input = input.map(str::trim).filter(|text| !text.is_empty());
        self.logger.log(
            ActivityLog::builder(session_id, ActivityType::RequestReceived)
                .user_id(state.admin_user_id)
                .status(ActivityStatus::Info)
                .custom("option", option)
                .custom("has_input", input.is_some())
                .build(),
        );

        let result = match MenuAction::from_option(option) {
            Some(MenuAction::CreateProject) => self.create_project(&mut state, input).await,
            Some(MenuAction::ManageTasks) => self.manage_tasks(&mut state, input),
            Some(MenuAction::ConsultTasks) => self.consult_tasks(&mut state, input).await,
            Some(MenuAction::Exit) => Ok(self.exit(&mut state)),
            None => {
                warn!("Invalid option {} for session {}", option, session_id);
                Ok(MenuReply::text(INVALID_OPTION))
            }
        };

        debug!(
            "Session {} option {} handled in {:?}",
            session_id,
            option,
            started.elapsed()
        );

        result.unwrap_or_else(|e| {
            error!(
                "Failed to process option {} for session {}: {:#}",
                option, session_id, e
            );
            MenuReply::with_menu(INTERNAL_ERROR)
        })
    }

    pub async fn bind_admin_user(&self, session_id: &str, user_id: i64) {
        let handle = self.session(session_id);
        handle.lock().await.admin_user_id = Some(user_id);
        info!("Session {} bound to admin user {}", session_id, user_id);
    }

    /// Mark a session as exited; the sweeper evicts it after the delay
    pub async fn end_session(&self, session_id: &str) {
        let handle = self.session(session_id);
        let mut state = handle.lock().await;
        self.mark_ended(&mut state);
    }

    /// Unknown sessions count as active, since a new session starts active
    pub async fn is_session_active(&self, session_id: &str) -> bool {
        match self.sessions.get(session_id) {
            Some(handle) => handle.lock().await.active,
            None => true,
        }
    }

    pub async fn session_snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        let handle = self.sessions.get(session_id)?;
        let state = handle.lock().await;
        Some(state.snapshot())
    }

    /// Words from `admin_id`'s project names starting with `prefix`
    pub fn project_suggestions(&self, admin_id: i64, prefix: &str) -> Vec<String> {
        self.index.suggestions(admin_id, prefix.trim())
    }

    pub fn related_projects(&self, project_name: &str) -> Vec<String> {
        self.index.related(project_name)
    }

    // ===== Option 1: create project =====

    async fn create_project(&self, state: &mut SessionState, idea: Option<&str>) -> Result<MenuReply> {
        let Some(idea) = idea else {
            // a session with a project keeps its phase until a new idea arrives
            if !state.has_project() {
                state.phase = SessionPhase::AwaitingIdea;
            }
            return Ok(MenuReply::text(IDEA_PROMPT));
        };

        info!("Project idea received for session {}: {}", state.session_id, idea);

        let generation = self.generate(state, idea).await;
        let failed = generation.failure.is_some();

        let accepted = if failed { None } else { generation.text.as_deref() };
        let name = accepted
            .and_then(extract_project_name)
            .or_else(|| derive_name_from_idea(idea));
        let tasks = accepted.map(extract_tasks).unwrap_or_default();

        // A failed generation still establishes a project built from the idea.
        let context = if failed {
            Some(idea.to_string())
        } else {
            generation.text
        };

        if let Some(replaced) = state.replace_project_context(context, name.clone()) {
            info!(
                "Session {} replaced project '{}' with '{}'",
                state.session_id,
                replaced,
                name.as_deref().unwrap_or("(unnamed)")
            );
            self.logger.log(
                ActivityLog::builder(state.session_id.as_str(), ActivityType::ProjectReplaced)
                    .user_id(state.admin_user_id)
                    .message(format!("Replaced project '{}'", replaced))
                    .custom("previous", replaced)
                    .build(),
            );
        }

        let added = state.ingest_tasks(&tasks)?;
        info!(
            "Session {} project '{}' established with {} tasks",
            state.session_id,
            state.display_name(),
            added
        );

        if let Some(name) = &name {
            self.index
                .record_project(name, state.last_project.as_deref(), state.admin_user_id);
            state.last_project = Some(name.clone());
        }

        let (notice, project_id) = self.persist_project(state, idea, failed).await;

        let mut activity = ActivityLog::builder(state.session_id.as_str(), ActivityType::ProjectCreated)
            .user_id(state.admin_user_id)
            .message(state.display_name().to_string())
            .custom("tasks", added)
            .custom("minimal", failed);
        if let Some(project_id) = project_id {
            activity = activity.custom("project_id", project_id);
        }
        self.logger.log(activity.build());

        let body = if failed {
            format!(
                "Basic outline from your idea.\n\nProject name: {}\n\nOriginal idea: {}\n",
                name.as_deref().unwrap_or("(unnamed)"),
                idea
            )
        } else {
            state.context.clone().unwrap_or_default()
        };

        Ok(MenuReply::with_menu(format!(
            "PROJECT DEVELOPED\n\n{}\n\n{}Next step: manage the tasks from the main menu.",
            body, notice
        )))
    }

    async fn generate(&self, state: &SessionState, idea: &str) -> Generation {
        let prompt = self.prompt_template.replace("{{IDEA}}", idea);
        let started = Instant::now();

        let generation = match self.generator.generate(&prompt, self.max_tokens).await {
            Ok(text) if looks_like_failure(&text) => Generation {
                text: Some(text),
                failure: Some((
                    "in_band_failure",
                    "Generator returned a failure message".to_string(),
                )),
            },
            Ok(text) => Generation {
                text: Some(text),
                failure: None,
            },
            Err(e) => Generation {
                text: None,
                failure: Some((e.reason_code(), e.to_string())),
            },
        };

        debug!("Generation for session {} took {:?}", state.session_id, started.elapsed());

        if let Some((reason, message)) = &generation.failure {
            error!(
                "Text generation failed for session {} ({}): {}",
                state.session_id, reason, message
            );
            self.logger.log(
                ActivityLog::builder(state.session_id.as_str(), ActivityType::GenerationFailed)
                    .user_id(state.admin_user_id)
                    .error(message.clone(), *reason)
                    .processing_time(started.elapsed().as_millis() as i64)
                    .build(),
            );
        }

        generation
    }

    async fn persist_project(
        &self,
        state: &SessionState,
        idea: &str,
        failed: bool,
    ) -> (String, Option<ProjectId>) {
        let Some(admin_id) = state.admin_user_id else {
            warn!(
                "Project not persisted: no admin user bound to session {}",
                state.session_id
            );
            let notice = if failed {
                "Not saved: project generation failed and no user is bound to this session.\n"
            } else {
                "Not saved: no user is bound to this session.\n"
            };
            return (notice.to_string(), None);
        };

        let (description, task_lines): (Option<String>, Vec<String>) = if failed {
            (Some(idea.to_string()), Vec::new())
        } else {
            (
                state.context.clone(),
                state.task_block.lines().map(str::to_string).collect(),
            )
        };

        match self
            .projects
            .create_project_for_admin(admin_id, state.project_name.clone(), description, &task_lines)
            .await
        {
            Ok(project_id) => {
                info!(
                    "Persisted project {} for admin {} ({} tasks)",
                    project_id,
                    admin_id,
                    task_lines.len()
                );
                let notice = if failed {
                    "Minimal project saved (generation failed, no tasks).\n"
                } else {
                    "Project saved.\n"
                };
                (notice.to_string(), Some(project_id))
            }
            Err(e) => {
                error!(
                    "Failed to persist project for admin {} in session {}: {:#}",
                    admin_id, state.session_id, e
                );
                self.logger.log(
                    ActivityLog::builder(state.session_id.as_str(), ActivityType::PersistenceFailed)
                        .user_id(Some(admin_id))
                        .error(e.to_string(), "project_store")
                        .build(),
                );
                (format!("Could not save the project: {}\n", e), None)
            }
        }
    }

    // ===== Option 2: manage tasks =====

    fn manage_tasks(&self, state: &mut SessionState, input: Option<&str>) -> Result<MenuReply> {
        let Some(text) = input else {
            return Ok(Self::task_view(state));
        };

        if let Some(number) = parse_task_number(text) {
            return self.complete_task(state, number);
        }

        if let Some(prefix) = strip_suggest_prefix(text) {
            return Ok(Self::suggest_tasks(state, &prefix));
        }

        self.add_task(state, text)
    }

    fn task_view(state: &SessionState) -> MenuReply {
        if !state.tasks.is_empty() {
            return MenuReply::text(format!(
                "TASK MANAGEMENT: {}\n\n\
                 Current tasks: {}\n\n\
                 {}\n\n\
                 Type a description to add a new task, a task number to mark it as completed, \
                 or \"suggest: <prefix>\" to search the task index.",
                state.display_name(),
                state.tasks.len(),
                state.task_block
            ));
        }

        if state.has_project() {
            return MenuReply::text(format!(
                "CREATE FIRST TASK: {}\n\n\
                 The project has no tasks yet.\n\
                 Type the description of the first task.",
                state.display_name()
            ));
        }

        MenuReply::text(NO_PROJECT_FOR_TASKS)
    }

    fn suggest_tasks(state: &SessionState, prefix: &str) -> MenuReply {
        if prefix.is_empty() || state.trie.is_empty() {
            return MenuReply::with_menu(
                "SUGGESTIONS\n\nThere is no task index for this session or the prefix is empty.",
            );
        }

        let words = state.trie.words_with_prefix(prefix);
        if words.is_empty() {
            return MenuReply::with_menu(format!(
                "SUGGESTIONS\n\nNo tasks match the prefix '{}'.",
                prefix
            ));
        }

        let lines = words
            .iter()
            .enumerate()
            .map(|(i, word)| format!("{}. {}", i + 1, word))
            .collect::<Vec<_>>()
            .join("\n");

        MenuReply::with_menu(format!("SUGGESTIONS for '{}':\n\n{}", prefix, lines))
    }

    fn add_task(&self, state: &mut SessionState, text: &str) -> Result<MenuReply> {
        if !state.has_project() {
            warn!("Task rejected for session {}: no project", state.session_id);
            return Ok(MenuReply::with_menu(NO_PROJECT));
        }

        let task = normalize_whitespace(text);
        if state.tasks.contains(&task) {
            return Ok(MenuReply::with_menu(format!("Task already exists: {}", task)));
        }

        state.ingest_tasks([task.as_str()])?;
        info!(
            "Task #{} added to session {}: {}",
            state.tasks.len(),
            state.session_id,
            task
        );
        self.logger.log(
            ActivityLog::builder(state.session_id.as_str(), ActivityType::TaskAdded)
                .user_id(state.admin_user_id)
                .message(task.clone())
                .custom("task_number", state.tasks.len())
                .build(),
        );

        Ok(MenuReply::with_menu(format!("Task added: {}", task)))
    }

    fn complete_task(&self, state: &mut SessionState, number: usize) -> Result<MenuReply> {
        if !state.has_project() {
            return Ok(MenuReply::with_menu(NO_PROJECT));
        }

        let reply = match state.complete_task(number)? {
            Completion::NoTasks => MenuReply::with_menu(NO_TASKS),
            Completion::OutOfRange { number, total } => MenuReply::with_menu(format!(
                "Error: invalid task number.\n\n\
                 Available tasks: 1 to {total}\n\
                 Your input: {number}\n\n\
                 Please enter a number between 1 and {total}."
            )),
            Completion::AlreadyCompleted { number } => MenuReply::with_menu(format!(
                "TASK ALREADY COMPLETED\n\n\
                 Project: {}\n\
                 Task #{} was already completed.\n\n\
                 Choose option 3 to review the status of every task.",
                state.display_name(),
                number
            )),
            Completion::Completed { number, task } => {
                let progress = state.progress();
                info!(
                    "Task #{} completed in session {}: {}/{} done",
                    number, state.session_id, progress.completed, progress.total
                );
                self.logger.log(
                    ActivityLog::builder(state.session_id.as_str(), ActivityType::TaskCompleted)
                        .user_id(state.admin_user_id)
                        .message(task.clone())
                        .custom("task_number", number)
                        .custom("completed", progress.completed)
                        .custom("total", progress.total)
                        .build(),
                );

                MenuReply::with_menu(format!(
                    "TASK COMPLETED\n\n\
                     Project: {}\n\
                     Task #{} completed: {}\n\n\
                     {}\n\
                     Pending: {} tasks",
                    state.display_name(),
                    number,
                    task,
                    progress_line(progress),
                    progress.pending()
                ))
            }
        };

        Ok(reply)
    }

    // ===== Option 3: consult tasks =====

    async fn consult_tasks(&self, state: &mut SessionState, input: Option<&str>) -> Result<MenuReply> {
        match input {
            Some(text) => match parse_task_number(text) {
                Some(number) => self.complete_task(state, number),
                None => Ok(MenuReply::with_menu(INVALID_TASK_NUMBER)),
            },
            None if !state.tasks.is_empty() => Ok(Self::progress_view(state)),
            None => Ok(self.stored_tasks_view(state).await),
        }
    }

    fn progress_view(state: &SessionState) -> MenuReply {
        let progress = state.progress();
        let lines = state
            .tasks
            .iter()
            .enumerate()
            .map(|(i, task)| {
                let number = i + 1;
                if state.completed.contains(&number) {
                    format!("[x] {}. {} (completed)", number, task)
                } else {
                    format!("[ ] {}. {} (pending)", number, task)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        MenuReply::text(format!(
            "TASKS: {}\n\n\
             {}\n\
             Completed: {} | Pending: {}\n\n\
             {}\n\n\
             Type a task number to mark it as completed.",
            state.display_name(),
            progress_line(progress),
            progress.completed,
            progress.pending(),
            lines
        ))
    }

    /// Option 3 without session tasks: show the admin's last stored project
    async fn stored_tasks_view(&self, state: &SessionState) -> MenuReply {
        let Some(admin_id) = state.admin_user_id else {
            return MenuReply::with_menu(
                "TASKS\n\nNo tasks are stored in this session and no user is bound to it.",
            );
        };

        match self.last_stored_project(admin_id).await {
            Ok(None) => MenuReply::with_menu("TASKS\n\nNo projects are stored for your user."),
            Ok(Some((project, tasks))) if tasks.is_empty() => MenuReply::with_menu(format!(
                "TASKS: {}\n\nNo tasks are stored for this project.",
                project.name
            )),
            Ok(Some((project, tasks))) => {
                let lines = tasks
                    .iter()
                    .enumerate()
                    .map(|(i, task)| format!("{}. {} - Status: {}", i + 1, task.title, task.status))
                    .collect::<Vec<_>>()
                    .join("\n");

                MenuReply::with_menu(format!(
                    "TASKS: {}\n\nStored tasks: {}\n\n{}",
                    project.name,
                    tasks.len(),
                    lines
                ))
            }
            Err(e) => {
                error!("Failed to load stored projects for admin {}: {:#}", admin_id, e);
                self.logger.log(
                    ActivityLog::builder(state.session_id.as_str(), ActivityType::PersistenceFailed)
                        .user_id(Some(admin_id))
                        .error(e.to_string(), "project_store")
                        .build(),
                );
                MenuReply::with_menu(format!("Could not read stored projects: {}", e))
            }
        }
    }

    async fn last_stored_project(&self, admin_id: i64) -> Result<Option<(Project, Vec<Task>)>> {
        let Some(project) = self.projects.projects_for_admin(admin_id).await?.pop() else {
            return Ok(None);
        };
        let tasks = self.projects.tasks_for_project(project.id).await?;
        Ok(Some((project, tasks)))
    }

    // ===== Option 4: exit =====

    fn exit(&self, state: &mut SessionState) -> MenuReply {
        self.mark_ended(state);
        MenuReply::text(format!(
            "Thanks for using the project assistant. Goodbye! (Session {} ended)",
            state.session_id
        ))
    }

    fn mark_ended(&self, state: &mut SessionState) {
        state.mark_exited();
        info!("Session {} ended", state.session_id);
        self.logger.log(
            ActivityLog::builder(state.session_id.as_str(), ActivityType::SessionEnded)
                .user_id(state.admin_user_id)
                .custom("interactions", state.interactions)
                .build(),
        );
    }
}

fn progress_line(progress: Progress) -> String {
    format!(
        "Progress: {}/{} tasks completed ({:.1}%)",
        progress.completed,
        progress.total,
        progress.percent()
    )
}

/// Digits-only input is a task number; oversized numbers stay out of range.
fn parse_task_number(text: &str) -> Option<usize> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(text.parse().unwrap_or(usize::MAX))
}

fn strip_suggest_prefix(text: &str) -> Option<String> {
    let head = text.get(..SUGGEST_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(SUGGEST_PREFIX) {
        return None;
    }
    Some(text[SUGGEST_PREFIX.len()..].trim().to_lowercase())
}
