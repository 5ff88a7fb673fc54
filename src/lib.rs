#![doc = "The `taskshare` library crate."]
#![doc = ""]
#![doc = "A multi-user task list: accounts with server-side sessions, tasks owned by"]
#![doc = "their creator and shared with collaborators by email, and the access-control"]
#![doc = "rules deciding who sees and who may change which task. The binary"]
#![doc = "(`main.rs`) wires these into an actix-web server."]

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod views;

pub use crate::error::AppError;
pub use crate::state::AppState;
