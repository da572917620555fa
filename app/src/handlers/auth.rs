use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use common::{
    auth::{AUTH_SESSION_KEY, DEFAULT_USER_NAME},
    users::find_or_create_user,
    AppState,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    pub password: String,
}

fn render_login(status: StatusCode, error: Option<String>) -> Response {
    match (LoginTemplate { error }).render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render login page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template Error").into_response()
        }
    }
}

pub async fn root_redirect() -> Redirect {
    Redirect::to("/reports")
}

pub async fn login_get(State(state): State<Arc<AppState>>) -> Response {
    if state.config.app_password.is_none() {
        return Redirect::to("/").into_response();
    }
    render_login(StatusCode::OK, None)
}

pub async fn login_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<LoginForm>,
) -> Response {
    let Some(correct_password) = &state.config.app_password else {
        return Redirect::to("/").into_response();
    };

    if payload.password != *correct_password {
        tracing::warn!("Rejected login attempt for '{}'", payload.username);
        return render_login(StatusCode::UNAUTHORIZED, Some("Invalid password".into()));
    }

    let name = match payload.username.trim() {
        "" => DEFAULT_USER_NAME,
        name => name,
    };

    let user_id = match find_or_create_user(&state.db, name).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to load user '{}': {}", name, e);
            return render_login(StatusCode::INTERNAL_SERVER_ERROR, Some("Could not sign in".into()));
        }
    };

    if let Err(e) = session.insert(AUTH_SESSION_KEY, user_id).await {
        tracing::error!("Failed to store session: {}", e);
        return render_login(StatusCode::INTERNAL_SERVER_ERROR, Some("Could not sign in".into()));
    }

    tracing::info!("User {} signed in", user_id);
    Redirect::to("/").into_response()
}

pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to clear session: {}", e);
    }
    Redirect::to("/login")
}
