//! Session tokens and the cookie that carries them.
//!
//! The token is 256 bits from the thread RNG, hex encoded. The cookie value is
//! signed with a key derived from `SESSION_SECRET`, so a tampered or forged
//! cookie is rejected before the session store is consulted.

use actix_web::cookie::{Cookie, CookieJar, Key, SameSite};
use actix_web::HttpRequest;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

const TOKEN_BYTES: usize = 32;

/// Everything needed to issue, read and clear session cookies.
#[derive(Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    key: Key,
    pub ttl: Duration,
}

impl SessionSettings {
    /// `secret` must be at least 32 bytes long.
    pub fn new(cookie_name: impl Into<String>, secret: &[u8], ttl: Duration) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            key: Key::derive_from(secret),
            ttl,
        }
    }

    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }

    /// The verified session token carried by `req`, if any.
    pub fn token_from_request(&self, req: &HttpRequest) -> Option<String> {
        let cookie = req.cookie(&self.cookie_name)?;
        self.verify(cookie)
    }

    /// Checks the cookie signature and returns the bare token.
    pub fn verify(&self, cookie: Cookie<'static>) -> Option<String> {
        let mut jar = CookieJar::new();
        jar.add_original(cookie);
        let verified = jar.signed(&self.key).get(&self.cookie_name);
        verified.map(|c| c.value().to_string())
    }

    /// A signed cookie carrying `token`.
    ///
    /// `Secure` is set exactly when the request itself arrived over https.
    pub fn issue_cookie(&self, req: &HttpRequest, token: &str) -> Cookie<'static> {
        let cookie = Cookie::build(self.cookie_name.clone(), token.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(is_secure(req))
            .finish();

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);
        let signed = jar.get(&self.cookie_name).cloned();
        signed.unwrap_or_else(|| Cookie::new(self.cookie_name.clone(), String::new()))
    }

    /// A cookie instructing the browser to drop the session cookie.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.cookie_name.clone(), String::new())
            .path("/")
            .finish();
        cookie.make_removal();
        cookie
    }
}

/// A fresh opaque session token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_secure(req: &HttpRequest) -> bool {
    req.connection_info().scheme() == "https"
}
