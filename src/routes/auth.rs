use crate::{
    auth::{
        generate_token, hash_password, verify_password, LoginRequest, RegisterRequest,
        RequestContext,
    },
    error::AppError,
    models::{normalize_email, User},
    routes::{redirect_home, render_failure},
    state::AppState,
};
use actix_web::{cookie::Cookie, get, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Register a new user
///
/// Creates the account, signs the new user in and redirects home. Nothing is
/// written unless every check passes.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    ctx: RequestContext,
    req: HttpRequest,
    form: web::Form<RegisterRequest>,
) -> HttpResponse {
    let user = match create_account(&state, form.into_inner()).await {
        Ok(user) => user,
        Err(e) => return render_failure(&state, None, e, "Error registering you!").await,
    };
    info!("Registered user {}", user.id);

    match start_session(&state, &req, ctx.session_token.as_deref(), user.id).await {
        Ok(cookie) => redirect_home(Some(cookie)),
        Err(e) => {
            render_failure(
                &state,
                None,
                e,
                "Your account was created but we could not sign you in. Please log in.",
            )
            .await
        }
    }
}

/// Login user
///
/// Verifies the credentials and binds a fresh session to the user.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    ctx: RequestContext,
    req: HttpRequest,
    form: web::Form<LoginRequest>,
) -> HttpResponse {
    let result = match authenticate(&state, &form).await {
        Ok(user) => start_session(&state, &req, ctx.session_token.as_deref(), user.id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(cookie) => redirect_home(Some(cookie)),
        Err(e) => render_failure(&state, None, e, "Error logging you in!").await,
    }
}

/// Logout user
///
/// Always redirects home, with or without a session to destroy.
#[get("/logout")]
pub async fn logout(state: web::Data<AppState>, ctx: RequestContext) -> HttpResponse {
    if let Some(token) = &ctx.session_token {
        if let Err(e) = state.store.sessions.destroy_session(token).await {
            warn!("Failed to destroy session on logout: {}", e);
        }
    }
    redirect_home(Some(state.session.removal_cookie()))
}

async fn create_account(state: &AppState, mut form: RegisterRequest) -> Result<User, AppError> {
    // Checked in the same normalized form collaborator entries and logins use.
    form.email = normalize_email(&form.email);

    let mut problems = match form.validate() {
        Ok(()) => Vec::new(),
        Err(e) => AppError::from(e).user_messages(),
    };
    if !form.passwords_match() {
        problems.push("Password and password confirmation do not match".to_string());
    }
    if !problems.is_empty() {
        return Err(AppError::ValidationError(problems));
    }

    if state.store.users.find_user_by_email(&form.email).await?.is_some() {
        return Err(AppError::validation("Email already registered"));
    }

    let password_hash = hash_password(&form.password, state.bcrypt_cost)?;
    let user = User::new(&form.email, &form.name, password_hash);
    state.store.users.insert_user(&user).await?;
    Ok(user)
}

async fn authenticate(state: &AppState, form: &LoginRequest) -> Result<User, AppError> {
    form.validate()?;

    let email = normalize_email(&form.email);
    let user = state
        .store
        .users
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("No user exists with that email".into()))?;

    if verify_password(&form.password, &user.password_hash)? {
        Ok(user)
    } else {
        info!("Rejected password for user {}", user.id);
        Err(AppError::Unauthorized("Incorrect password".into()))
    }
}

/// Binds a new session to `user_id` and returns the cookie carrying it.
///
/// The session the request arrived with, if any, is destroyed first so a
/// token never changes owner.
async fn start_session(
    state: &AppState,
    req: &HttpRequest,
    previous: Option<&str>,
    user_id: Uuid,
) -> Result<Cookie<'static>, AppError> {
    if let Some(previous) = previous {
        if let Err(e) = state.store.sessions.destroy_session(previous).await {
            warn!("Failed to destroy previous session: {}", e);
        }
    }

    let token = generate_token();
    let expires_at = state.session.expires_at(Utc::now());
    state
        .store
        .sessions
        .create_session(&token, user_id, expires_at)
        .await?;
    Ok(state.session.issue_cookie(req, &token))
}
