//! Runtime configuration read from environment variables (and `.env`, loaded in
//! `main` via `dotenv`).
//!
//! | Variable | Default |
//! |---|---|
//! | `DATABASE_URL` | unset: in-memory store |
//! | `SERVER_HOST` | `127.0.0.1` |
//! | `SERVER_PORT` | `8080` |
//! | `SESSION_SECRET` | required, at least 32 bytes |
//! | `SESSION_COOKIE_NAME` | `taskshare.sid` |
//! | `SESSION_TTL_HOURS` | `336` (two weeks) |
//! | `BCRYPT_COST` | `12` |
//! | `TASK_MUTATION_POLICY` | `collaborators` |

use std::env;
use std::str::FromStr;

use crate::access::MutationPolicy;
use crate::error::AppError;

pub const DEFAULT_COOKIE_NAME: &str = "taskshare.sid";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 14;
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub session_secret: String,
    pub session_cookie_name: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub mutation_policy: MutationPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| AppError::InternalServerError("SESSION_SECRET must be set".into()))?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(AppError::InternalServerError(format!(
                "SESSION_SECRET must be at least {} bytes",
                MIN_SESSION_SECRET_LEN
            )));
        }

        let bcrypt_cost = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(AppError::InternalServerError(
                "BCRYPT_COST must be between 4 and 31".into(),
            ));
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            server_port: parse_var("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            session_secret,
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| DEFAULT_COOKIE_NAME.to_string()),
            session_ttl_hours: parse_var("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?,
            bcrypt_cost,
            mutation_policy: parse_var("TASK_MUTATION_POLICY", MutationPolicy::default())?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::InternalServerError(format!("{} has an invalid value", name))),
        Err(_) => Ok(default),
    }
}
