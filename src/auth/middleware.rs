use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, HttpRequest,
};
use chrono::Utc;
use futures::future::{ready, LocalBoxFuture, Ready};
use log::{debug, warn};
use std::rc::Rc;

use crate::auth::RequestContext;
use crate::state::AppState;

/// Resolves the session cookie into a [`RequestContext`] for every request.
///
/// This middleware never rejects a request. Anything that prevents resolving a
/// user (no cookie, bad signature, expired session, store failure) leaves the
/// request anonymous; the `CurrentUser` extractor does the gating.
pub struct SessionMiddleware;

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let ctx = match req.app_data::<web::Data<AppState>>().cloned() {
                Some(state) => resolve_context(&state, req.request()).await,
                None => {
                    warn!("AppState missing from app data; treating request as anonymous");
                    RequestContext::anonymous()
                }
            };
            req.extensions_mut().insert(ctx);
            service.call(req).await
        })
    }
}

/// Looks up the session and user behind the request's cookie.
pub async fn resolve_context(state: &AppState, req: &HttpRequest) -> RequestContext {
    let token = match state.session.token_from_request(req) {
        Some(token) => token,
        None => return RequestContext::anonymous(),
    };

    let user_id = match state.store.sessions.find_session_user(&token, Utc::now()).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            debug!("Session cookie refers to no live session");
            return RequestContext {
                user: None,
                session_token: Some(token),
            };
        }
        Err(e) => {
            warn!("Session lookup failed, continuing anonymously: {}", e);
            return RequestContext {
                user: None,
                session_token: Some(token),
            };
        }
    };

    let user = match state.store.users.find_user_by_id(user_id).await {
        Ok(user) => user,
        Err(e) => {
            warn!("User lookup for session failed, continuing anonymously: {}", e);
            None
        }
    };

    RequestContext {
        user,
        session_token: Some(token),
    }
}
