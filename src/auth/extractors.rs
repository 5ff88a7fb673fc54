use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::User;

/// Per-request view of who is calling.
///
/// Built once by [`SessionMiddleware`](super::SessionMiddleware) and stored in
/// the request extensions; handlers receive it by extraction. It is never
/// written back to the session.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<User>,
    /// The verified token of the session the request arrived with, if any.
    pub session_token: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

impl FromRequest for RequestContext {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Without the middleware there is nothing to resolve: treat as anonymous.
        let ctx = req
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();
        ready(Ok(ctx))
    }
}

/// The authentication gate.
///
/// Extracting `CurrentUser` succeeds only when the request context carries a
/// user; otherwise the request ends with a bare 403 before the handler runs.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .extensions()
            .get::<RequestContext>()
            .and_then(|ctx| ctx.user.clone());
        match user {
            Some(user) => ready(Ok(CurrentUser(user))),
            None => ready(Err(AppError::Forbidden.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    fn ada() -> User {
        User::new("ada@example.com", "Ada", "hash".into())
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        let user = ada();
        req.extensions_mut().insert(RequestContext {
            user: Some(user.clone()),
            session_token: Some("tok".into()),
        });

        let mut payload = Payload::None;
        let extracted = CurrentUser::from_request(&req, &mut payload).await;
        assert_eq!(extracted.unwrap().0, user);
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_forbids_anonymous() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(RequestContext::anonymous());

        let mut payload = Payload::None;
        let err = CurrentUser::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
    }

    #[actix_rt::test]
    async fn test_context_defaults_to_anonymous() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let ctx = RequestContext::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert!(ctx.current_user().is_none());
        assert!(ctx.session_token.is_none());
    }
}
