use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

/// Reports that the taskshare process is up, with its crate name and version.
///
/// Answers without consulting the user, task or session stores, so it stays
/// green while the database is unreachable.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now()
    }))
}
