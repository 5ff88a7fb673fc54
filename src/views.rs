//! Server-rendered HTML for the single home page.
//!
//! All user-supplied text goes through [`escape_html`].

use actix_web::{http::header, http::StatusCode, HttpResponse};

use crate::models::{TaskView, User};

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
.errors{background:#fdecea;border:1px solid #f5c2c0;padding:.5rem 1rem}\
.task{border-bottom:1px solid #ddd;padding:.5rem 0}\
.complete .name{text-decoration:line-through;color:#777}\
.shared{font-size:.8rem;color:#555}\
form.inline{display:inline}";

/// Renders the home page as a complete response.
///
/// `user` selects between the signed-in page and the login/registration
/// forms. `tasks` is `None` when the list was not loaded for this response.
pub fn render_home(
    status: StatusCode,
    user: Option<&User>,
    tasks: Option<&[TaskView]>,
    errors: &[String],
) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
        .body(home_page(user, tasks, errors))
}

pub fn home_page(user: Option<&User>, tasks: Option<&[TaskView]>, errors: &[String]) -> String {
    let body = match user {
        Some(user) => signed_in(user, tasks.unwrap_or_default()),
        None => signed_out(),
    };
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Tasks</title>\
<style>{}</style></head><body><h1>Tasks</h1>{}{}</body></html>",
        STYLE,
        errors_block(errors),
        body
    )
}

fn errors_block(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape_html(e)))
        .collect();
    format!("<div class=\"errors\"><ul>{}</ul></div>", items)
}

fn signed_out() -> String {
    "<section><h2>Log in</h2>\
<form method=\"post\" action=\"/user/login\">\
<input type=\"email\" name=\"email\" placeholder=\"Email\" required>\
<input type=\"password\" name=\"password\" placeholder=\"Password\" required>\
<button type=\"submit\">Log in</button></form></section>\
<section><h2>Register</h2>\
<form method=\"post\" action=\"/user/register\">\
<input type=\"email\" name=\"email\" placeholder=\"Email\" required>\
<input type=\"text\" name=\"name\" placeholder=\"Name\" required>\
<input type=\"password\" name=\"password\" placeholder=\"Password\" required>\
<input type=\"password\" name=\"passwordConfirmation\" placeholder=\"Confirm password\" required>\
<button type=\"submit\">Register</button></form></section>"
        .to_string()
}

fn signed_in(user: &User, tasks: &[TaskView]) -> String {
    let list = if tasks.is_empty() {
        "<p>No tasks yet.</p>".to_string()
    } else {
        let items: String = tasks.iter().map(task_item).collect();
        format!("<ul class=\"tasks\">{}</ul>", items)
    };

    format!(
        "<p>Welcome, {} <a href=\"/user/logout\">Log out</a></p>\
<section><h2>Your tasks</h2>{}</section>\
<section><h2>New task</h2>\
<form method=\"post\" action=\"/task/create\">\
<input type=\"text\" name=\"name\" placeholder=\"Name\" required>\
<input type=\"text\" name=\"description\" placeholder=\"Description\">\
<input type=\"email\" name=\"collaborator1\" placeholder=\"Collaborator email\">\
<input type=\"email\" name=\"collaborator2\" placeholder=\"Collaborator email\">\
<input type=\"email\" name=\"collaborator3\" placeholder=\"Collaborator email\">\
<button type=\"submit\">Create</button></form></section>",
        escape_html(&user.name),
        list
    )
}

fn task_item(view: &TaskView) -> String {
    let task = &view.task;
    let class = if task.is_complete { "task complete" } else { "task" };
    let toggle_label = if task.is_complete {
        "Mark incomplete"
    } else {
        "Mark complete"
    };
    let shared = if view.is_my_task {
        String::new()
    } else {
        " <span class=\"shared\">shared with you</span>".to_string()
    };
    let collaborators = if task.collaborators.is_empty() {
        String::new()
    } else {
        format!(
            "<div class=\"shared\">Collaborators: {}</div>",
            escape_html(&task.collaborators.join(", "))
        )
    };

    format!(
        "<li class=\"{class}\"><span class=\"name\">{name}</span>{shared}\
<div>{description}</div>{collaborators}\
<form class=\"inline\" method=\"post\" action=\"/tasks/{id}/complete\"><button type=\"submit\">{toggle}</button></form>\
<form class=\"inline\" method=\"post\" action=\"/tasks/{id}/delete\"><button type=\"submit\">Delete</button></form></li>",
        class = class,
        name = escape_html(&task.name),
        shared = shared,
        description = escape_html(&task.description),
        collaborators = collaborators,
        id = task.id,
        toggle = toggle_label,
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
