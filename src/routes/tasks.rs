use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{Task, TaskInput, User},
    routes::{redirect_home, render_failure},
    state::AppState,
};
use actix_web::{post, web, HttpResponse};
use log::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Creates a new task owned by the current user.
///
/// ## Form fields:
/// - `name`: required, 1 to 200 characters.
/// - `description` (optional): up to 1000 characters.
/// - `collaborator1` .. `collaborator3` (optional): emails granting view access.
///
/// A single malformed collaborator rejects the whole task; nothing is saved.
#[post("/create")]
pub async fn create_task(
    CurrentUser(user): CurrentUser,
    state: web::Data<AppState>,
    form: web::Form<TaskInput>,
) -> HttpResponse {
    match create(&state, &user, form.into_inner()).await {
        Ok(task) => {
            info!("User {} created task {}", user.id, task.id);
            redirect_home(None)
        }
        Err(e) => render_failure(&state, Some(&user), e, "Error saving task!").await,
    }
}

/// Flips the completion flag of a task.
///
/// The new value is the negation of the stored one, read just before writing.
/// Unknown ids and tasks the mutation policy denies both answer "not found".
#[post("/{id}/complete")]
pub async fn toggle_complete(
    CurrentUser(user): CurrentUser,
    state: web::Data<AppState>,
    task_id: web::Path<String>,
) -> HttpResponse {
    match toggle(&state, &user, &task_id).await {
        Ok(is_complete) => {
            info!(
                "User {} set task {} complete={}",
                user.id, task_id, is_complete
            );
            redirect_home(None)
        }
        Err(e) => render_failure(&state, Some(&user), e, "Could not update task!").await,
    }
}

/// Deletes a task.
///
/// Deleting an id that does not exist is a successful no-op. A task the
/// mutation policy denies answers "not found".
#[post("/{id}/delete")]
pub async fn delete_task(
    CurrentUser(user): CurrentUser,
    state: web::Data<AppState>,
    task_id: web::Path<String>,
) -> HttpResponse {
    match delete(&state, &user, &task_id).await {
        Ok(true) => {
            info!("User {} deleted task {}", user.id, task_id);
            redirect_home(None)
        }
        Ok(false) => redirect_home(None),
        Err(e) => render_failure(&state, Some(&user), e, "Could not delete task!").await,
    }
}

fn task_not_found() -> AppError {
    AppError::NotFound("Could not find task!".into())
}

async fn create(state: &AppState, user: &User, mut input: TaskInput) -> Result<Task, AppError> {
    // A name of only whitespace counts as missing.
    input.name = input.name.trim().to_string();
    input.validate()?;
    let collaborators = input.collaborators()?;

    let task = Task::new(input, user.id, collaborators);
    state.store.tasks.insert_task(&task).await?;
    Ok(task)
}

/// Loads a task the current user is allowed to mutate.
async fn load_for_mutation(
    state: &AppState,
    user: &User,
    id: Uuid,
) -> Result<Option<Task>, AppError> {
    let task = match state.store.tasks.find_task(id).await? {
        Some(task) => task,
        None => return Ok(None),
    };
    if !state.mutation_policy.permits(user, &task) {
        warn!(
            "User {} denied mutation of task {} under policy {}",
            user.id, id, state.mutation_policy
        );
        return Err(task_not_found());
    }
    Ok(Some(task))
}

async fn toggle(state: &AppState, user: &User, raw_id: &str) -> Result<bool, AppError> {
    let id = Uuid::parse_str(raw_id).map_err(|_| task_not_found())?;
    let task = load_for_mutation(state, user, id)
        .await?
        .ok_or_else(task_not_found)?;

    let is_complete = !task.is_complete;
    if !state.store.tasks.set_task_complete(id, is_complete).await? {
        return Err(task_not_found());
    }
    Ok(is_complete)
}

async fn delete(state: &AppState, user: &User, raw_id: &str) -> Result<bool, AppError> {
    // A malformed id cannot name a stored task.
    let id = match Uuid::parse_str(raw_id) {
        Ok(id) => id,
        Err(_) => return Ok(false),
    };
    match load_for_mutation(state, user, id).await? {
        Some(_) => state.store.tasks.delete_task(id).await,
        None => Ok(false),
    }
}
