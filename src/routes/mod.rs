pub mod auth;
pub mod health;
pub mod home;
pub mod tasks;

use actix_web::{cookie::Cookie, http::header, web, HttpResponse, ResponseError};
use log::{error, info};

use crate::{access, error::AppError, models::User, state::AppState, views};

/// Routes above the gate are open to anonymous callers; `/tasks` and `/task`
/// handlers take a `CurrentUser` and answer 403 without one.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(home::index)
        .service(health::health)
        .service(
            web::scope("/user")
                .service(auth::register)
                .service(auth::login)
                .service(auth::logout),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::toggle_complete)
                .service(tasks::delete_task),
        )
        .service(web::scope("/task").service(tasks::create_task));
}

/// Post/redirect/get back to the home page.
pub(crate) fn redirect_home(cookie: Option<Cookie<'static>>) -> HttpResponse {
    let mut builder = HttpResponse::SeeOther();
    builder.insert_header((header::LOCATION, "/"));
    if let Some(cookie) = cookie {
        builder.cookie(cookie);
    }
    builder.finish()
}

/// Re-renders the home page with the error.
///
/// Infrastructure failures are logged with their detail and shown as
/// `generic`; everything else shows its own message. When a user is signed in
/// their task list is rendered too, if it can be loaded.
pub(crate) async fn render_failure(
    state: &AppState,
    user: Option<&User>,
    err: AppError,
    generic: &str,
) -> HttpResponse {
    let messages = match &err {
        AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
            error!("{}: {}", generic, err);
            vec![generic.to_string()]
        }
        _ => {
            info!("Request rejected: {}", err);
            err.user_messages()
        }
    };

    let tasks = match user {
        Some(user) => access::visible_tasks(state.store.tasks.as_ref(), user)
            .await
            .ok(),
        None => None,
    };

    views::render_home(err.status_code(), user, tasks.as_deref(), &messages)
}
