use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{validate_email, Validate};

use crate::error::AppError;

/// Maximum number of collaborator slots on the creation form.
pub const MAX_COLLABORATORS: usize = 3;

/// Form payload for creating a task.
///
/// Field names match the HTML form (`collaborator1` .. `collaborator3`). Every
/// collaborator slot is optional; an empty slot is simply ignored.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be between 1 and 200 characters.
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Task name is required"))]
    pub name: String,

    /// Maximum length of 1000 characters.
    #[serde(default)]
    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: String,

    #[serde(default)]
    pub collaborator1: Option<String>,
    #[serde(default)]
    pub collaborator2: Option<String>,
    #[serde(default)]
    pub collaborator3: Option<String>,
}

impl TaskInput {
    /// Checks every non-empty collaborator slot and returns the normalized list.
    ///
    /// One bad entry rejects the whole input; the error lists each offending entry.
    /// Empty slots are dropped and repeated addresses keep their first position.
    pub fn collaborators(&self) -> Result<Vec<String>, AppError> {
        let slots = [&self.collaborator1, &self.collaborator2, &self.collaborator3];

        let mut bad = Vec::new();
        let mut emails: Vec<String> = Vec::with_capacity(MAX_COLLABORATORS);
        for entry in slots.into_iter().flatten() {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            if !validate_email(entry) {
                bad.push(format!("Bad email: {}", entry));
                continue;
            }
            let email = super::normalize_email(entry);
            if !emails.contains(&email) {
                emails.push(email);
            }
        }

        if bad.is_empty() {
            Ok(emails)
        } else {
            Err(AppError::ValidationError(bad))
        }
    }
}

/// A task as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    /// The user who created the task.
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    /// Emails granting view access, in form order.
    pub collaborators: Vec<String>,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates an incomplete task owned by `owner_id`.
    ///
    /// `collaborators` is expected to be the output of [`TaskInput::collaborators`].
    pub fn new(input: TaskInput, owner_id: Uuid, collaborators: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: input.name.trim().to_string(),
            description: input.description,
            collaborators,
            is_complete: false,
            created_at: Utc::now(),
        }
    }
}

/// A task as presented to one particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    /// True when the viewer owns the task. Presentation only.
    pub is_my_task: bool,
}
