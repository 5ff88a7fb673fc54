use actix_web::{get, http::StatusCode, web, HttpResponse};

use crate::{access, auth::RequestContext, state::AppState, views};

/// The home page: login/registration when anonymous, the visible task list
/// otherwise.
#[get("/")]
pub async fn index(state: web::Data<AppState>, ctx: RequestContext) -> HttpResponse {
    let user = match ctx.current_user() {
        Some(user) => user,
        None => return views::render_home(StatusCode::OK, None, None, &[]),
    };

    match access::visible_tasks(state.store.tasks.as_ref(), user).await {
        Ok(tasks) => views::render_home(StatusCode::OK, Some(user), Some(&tasks), &[]),
        Err(e) => {
            log::error!("Loading tasks for user {} failed: {}", user.id, e);
            views::render_home(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some(user),
                None,
                &["Cannot load your tasks!".to_string()],
            )
        }
    }
}
