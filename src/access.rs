//! Access control for tasks.
//!
//! Two questions are answered here and nowhere else:
//!
//! 1. **Visibility**: which tasks does a user see? Those they own, plus those
//!    whose collaborator list contains their email.
//! 2. **Mutation**: may a user toggle or delete a given task? That is decided
//!    by the configured [`MutationPolicy`].

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::{Task, TaskView, User};
use crate::store::TaskStore;

/// Who may toggle completion on, or delete, a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPolicy {
    /// Any logged-in user may mutate any task they know the id of.
    AnyAuthenticated,
    /// Only users who can see the task (owner or collaborator).
    #[default]
    Collaborators,
}

impl MutationPolicy {
    pub fn permits(&self, user: &User, task: &Task) -> bool {
        match self {
            MutationPolicy::AnyAuthenticated => true,
            MutationPolicy::Collaborators => is_visible_to(task, user),
        }
    }
}

impl FromStr for MutationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "authenticated" | "any" => Ok(MutationPolicy::AnyAuthenticated),
            "collaborators" => Ok(MutationPolicy::Collaborators),
            other => Err(format!("unknown mutation policy: {}", other)),
        }
    }
}

impl fmt::Display for MutationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MutationPolicy::AnyAuthenticated => write!(f, "authenticated"),
            MutationPolicy::Collaborators => write!(f, "collaborators"),
        }
    }
}

pub fn is_owner(task: &Task, user: &User) -> bool {
    task.owner_id == user.id
}

pub fn is_collaborator(task: &Task, user: &User) -> bool {
    task.collaborators.iter().any(|email| *email == user.email)
}

/// A task is visible to its owner and to every listed collaborator.
pub fn is_visible_to(task: &Task, user: &User) -> bool {
    is_owner(task, user) || is_collaborator(task, user)
}

/// Keeps the tasks `user` may see, drops repeated ids and marks ownership.
pub fn annotate(tasks: Vec<Task>, user: &User) -> Vec<TaskView> {
    let mut seen = HashSet::new();
    tasks
        .into_iter()
        .filter(|task| is_visible_to(task, user) && seen.insert(task.id))
        .map(|task| TaskView {
            is_my_task: is_owner(&task, user),
            task,
        })
        .collect()
}

/// Loads every task visible to `user`.
///
/// A store failure yields an error, never a partial list.
pub async fn visible_tasks(
    tasks: &dyn TaskStore,
    user: &User,
) -> Result<Vec<TaskView>, AppError> {
    let found = tasks.find_visible_tasks(user.id, &user.email).await?;
    Ok(annotate(found, user))
}
