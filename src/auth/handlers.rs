use askama::Template;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Form;

use crate::auth::{accounts, codes, session};
use crate::error::{AppError, AppResult};
use crate::extractors::{cookie_value, MaybeUser};
use crate::forms::{LoginForm, RegistrationForm, VerifyForm};
use crate::routes::home::Html;
use crate::state::AppState;

/// Cookie carrying the pre-verification login session token.
const LOGIN_COOKIE: &str = "retronet_login";

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub flash: Vec<String>,
    pub email: String,
}

#[derive(Template)]
#[template(path = "pages/verify_login.html")]
pub struct VerifyTemplate {
    pub flash: Vec<String>,
}

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub flash: Vec<String>,
    pub username: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "pages/registration_statement.html")]
pub struct StatementTemplate;

// -- Cookie helpers --

fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

fn login_cookie(token: &str, ttl_minutes: i64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        LOGIN_COOKIE,
        token,
        ttl_minutes * 60
    )
}

fn clear_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", name)
}

/// Token from the pre-verification login cookie, if present.
pub struct LoginCookie(pub Option<String>);

impl FromRequestParts<AppState> for LoginCookie {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(LoginCookie(
            cookie_value(parts, LOGIN_COOKIE).map(str::to_string),
        ))
    }
}

/// Token from the session cookie, if present.
pub struct SessionCookie(pub Option<String>);

impl FromRequestParts<AppState> for SessionCookie {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(SessionCookie(
            cookie_value(parts, &state.config.auth.cookie_name).map(str::to_string),
        ))
    }
}

// -- Login --

/// GET /login
pub async fn login_page(maybe_user: MaybeUser) -> AppResult<Response> {
    if maybe_user.0.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    Ok(Html(LoginTemplate {
        flash: vec![],
        email: String::new(),
    })
    .into_response())
}

/// POST /login — password login or login-code issuance, per `login_type`.
pub async fn login_submit(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if maybe_user.0.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    if let Err(errors) = form.validate() {
        return Ok(Html(LoginTemplate {
            flash: errors.messages(),
            email: form.email.clone(),
        })
        .into_response());
    }

    let email = form.email.trim().to_string();

    if form.wants_code() {
        // The code row is persisted before delivery; a failed send leaves it
        // valid so the user can retry.
        let code = codes::issue_code(&state.db, &email)?;
        let body = format!(
            "Your login code is: {}\n\nThis code will expire in {} minutes.\n",
            code, state.config.auth.code_ttl_minutes
        );
        if let Err(e) = state.mailer.send(&email, "Your Login Code", &body).await {
            tracing::error!("Error sending verification code: {}", e);
            return Ok(Html(LoginTemplate {
                flash: vec!["Error sending verification code. Please try again.".to_string()],
                email,
            })
            .into_response());
        }

        let token =
            session::create_login_session(&state.db, &email, state.config.auth.code_ttl_minutes)?;
        return Ok((
            StatusCode::SEE_OTHER,
            [
                (header::LOCATION, "/verify_login".to_string()),
                (
                    header::SET_COOKIE,
                    login_cookie(&token, state.config.auth.code_ttl_minutes),
                ),
            ],
            "",
        )
            .into_response());
    }

    // Password login. One generic message for every failure mode.
    let password = form.password.as_deref().unwrap_or("");
    match codes::authenticate_password(&state.db, &email, password)? {
        Some(user_id) => {
            let token =
                session::create_session(&state.db, &user_id, state.config.auth.session_hours)?;
            Ok((
                StatusCode::SEE_OTHER,
                [
                    (header::LOCATION, "/dashboard".to_string()),
                    (
                        header::SET_COOKIE,
                        session_cookie(
                            &state.config.auth.cookie_name,
                            &token,
                            state.config.auth.session_hours,
                        ),
                    ),
                ],
                "",
            )
                .into_response())
        }
        None => Ok(Html(LoginTemplate {
            flash: vec!["Invalid email or password".to_string()],
            email,
        })
        .into_response()),
    }
}

// -- Verification --

/// GET /verify_login
pub async fn verify_page(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    login: LoginCookie,
) -> AppResult<Response> {
    if maybe_user.0.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    let Some(token) = login.0 else {
        return Ok(Redirect::to("/login").into_response());
    };
    if session::pending_email(&state.db, &token)?.is_none() {
        return Ok(Redirect::to("/login").into_response());
    }
    Ok(Html(VerifyTemplate { flash: vec![] }).into_response())
}

/// POST /verify_login — accept the code, establish the session.
pub async fn verify_submit(
    State(state): State<AppState>,
    login: LoginCookie,
    Form(form): Form<VerifyForm>,
) -> AppResult<Response> {
    let Some(login_token) = login.0 else {
        return Ok(Redirect::to("/login").into_response());
    };
    let Some(email) = session::pending_email(&state.db, &login_token)? else {
        return Ok(Redirect::to("/login").into_response());
    };

    if let Err(errors) = form.validate() {
        return Ok(Html(VerifyTemplate {
            flash: errors.messages(),
        })
        .into_response());
    }

    let result = codes::verify_code_and_authenticate(
        &state.db,
        &email,
        form.code.trim(),
        state.config.auth.code_ttl_minutes,
        state.config.auth.session_hours,
    )?;

    match result {
        Some(token) => {
            session::delete_session(&state.db, &login_token)?;
            Ok((
                StatusCode::SEE_OTHER,
                [(header::LOCATION, "/dashboard".to_string())],
                AppendHeaders([
                    (
                        header::SET_COOKIE,
                        session_cookie(
                            &state.config.auth.cookie_name,
                            &token,
                            state.config.auth.session_hours,
                        ),
                    ),
                    (header::SET_COOKIE, clear_cookie(LOGIN_COOKIE)),
                ]),
                "",
            )
                .into_response())
        }
        None => Ok(Html(VerifyTemplate {
            flash: vec!["Invalid or expired verification code".to_string()],
        })
        .into_response()),
    }
}

// -- Registration --

/// GET /register
pub async fn register_page(maybe_user: MaybeUser) -> AppResult<Response> {
    if maybe_user.0.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    Ok(Html(RegisterTemplate {
        flash: vec![],
        username: String::new(),
        email: String::new(),
    })
    .into_response())
}

/// POST /register
pub async fn register_submit(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Form(form): Form<RegistrationForm>,
) -> AppResult<Response> {
    if maybe_user.0.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let rerender = |flash: Vec<String>| {
        Html(RegisterTemplate {
            flash,
            username: form.username.clone(),
            email: form.email.clone(),
        })
        .into_response()
    };

    if let Err(errors) = form.validate() {
        return Ok(rerender(errors.messages()));
    }

    let created = accounts::register_user(
        &state.db,
        form.username.trim(),
        form.email.trim(),
        &form.password,
        form.referral_code.as_deref(),
    );

    let user_id = match created {
        Ok(id) => id,
        Err(accounts::RegisterError::EmailTaken) => {
            return Ok(rerender(vec!["Email already registered".to_string()]));
        }
        Err(accounts::RegisterError::UsernameTaken) => {
            return Ok(rerender(vec!["Username already taken".to_string()]));
        }
        Err(accounts::RegisterError::Repository(e)) => {
            tracing::error!("Error in registration: {}", e);
            return Ok(rerender(vec!["Error creating account".to_string()]));
        }
    };

    let token = session::create_session(&state.db, &user_id, state.config.auth.session_hours)?;
    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/dashboard".to_string()),
            (
                header::SET_COOKIE,
                session_cookie(
                    &state.config.auth.cookie_name,
                    &token,
                    state.config.auth.session_hours,
                ),
            ),
        ],
        "",
    )
        .into_response())
}

/// GET /registration_statement
pub async fn registration_statement() -> Html<StatementTemplate> {
    Html(StatementTemplate)
}

// -- Logout --

/// GET /logout — delete the session and redirect to login.
pub async fn logout(
    State(state): State<AppState>,
    cookie: SessionCookie,
) -> AppResult<Response> {
    if let Some(token) = cookie.0 {
        let _ = session::delete_session(&state.db, &token);
    }

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/login".to_string()),
            (
                header::SET_COOKIE,
                clear_cookie(&state.config.auth.cookie_name),
            ),
        ],
        "",
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::test_pool;
    use crate::mail::testing::RecordingMailer;
    use crate::mail::Mailer;
    use crate::state::AppState;
    use std::sync::{Arc, Mutex};

    fn test_state(mailer: Arc<dyn Mailer>) -> AppState {
        AppState {
            db: test_pool(),
            config: Config::default(),
            mailer,
        }
    }

    fn code_request(email: &str) -> Form<LoginForm> {
        Form(LoginForm {
            email: email.to_string(),
            password: None,
            login_type: Some("code".to_string()),
        })
    }

    async fn page_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn failed_code_delivery_keeps_the_code_usable() {
        let state = test_state(Arc::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }));
        accounts::register_user(&state.db, "ada", "ada@example.com", "password123", None)
            .unwrap();

        let response = login_submit(
            State(state.clone()),
            MaybeUser(None),
            code_request("ada@example.com"),
        )
        .await
        .unwrap();

        // Degrades to the login page with a retry message, not an error page
        assert_eq!(response.status(), StatusCode::OK);
        let page = page_text(response).await;
        assert!(page.contains("Error sending verification code. Please try again."));

        // The code row outlives the failed send and still authenticates
        let code: String = {
            let conn = state.db.get().unwrap();
            conn.query_row(
                "SELECT code FROM password_resets WHERE email = 'ada@example.com' AND used = 0",
                [],
                |row| row.get(0),
            )
            .unwrap()
        };
        let token =
            codes::verify_code_and_authenticate(&state.db, "ada@example.com", &code, 30, 168)
                .unwrap();
        assert!(token.is_some());
    }

    #[tokio::test]
    async fn delivered_code_redirects_to_verification() {
        let recorder = Arc::new(RecordingMailer::default());
        let state = test_state(recorder.clone());

        let response = login_submit(
            State(state),
            MaybeUser(None),
            code_request("visitor@example.com"),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/verify_login");

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "visitor@example.com");
        assert_eq!(sent[0].1, "Your Login Code");
    }
}
