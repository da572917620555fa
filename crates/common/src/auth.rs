use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use std::sync::Arc;
use crate::AppState;

/// Session key holding the logged-in user's id.
pub const AUTH_SESSION_KEY: &str = "user_id";

/// Seeded by the initial migration; owns all data when login is disabled.
pub const DEFAULT_USER_ID: i64 = 1;
pub const DEFAULT_USER_NAME: &str = "owner";

/// The user a request acts on behalf of. Every query is scoped to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: i64,
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserContext>()
            .copied()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    // If no password is set, authentication is disabled
    if state.config.app_password.is_none() {
        request.extensions_mut().insert(UserContext { user_id: DEFAULT_USER_ID });
        return next.run(request).await;
    }

    let user_id: Option<i64> = session
        .get(AUTH_SESSION_KEY)
        .await
        .unwrap_or(None);

    match user_id {
        Some(user_id) => {
            request.extensions_mut().insert(UserContext { user_id });
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}
