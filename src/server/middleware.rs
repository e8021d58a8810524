//! server::middleware
//!
//! Request tracing and the login gate.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::Instrument;

use super::error::AppError;
use super::AppState;
use crate::auth::{cookie_value, SESSION_COOKIE};
use crate::store::{StoreError, User, UserStore};

/// Where unauthenticated requests to gated routes are sent.
pub const LOGGED_OUT_PATH: &str = "/logged_out";

/// The signed-in user, inserted as a request extension by [`require_login`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Open an `http.request` span per request and echo its id back.
pub async fn request_tracing(request: Request<Body>, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let method = request.method().to_string();
    let route = request.uri().path().to_string();

    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %method,
        route = %route,
    );

    let mut response = async move {
        let response = next.run(request).await;
        tracing::debug!(status = response.status().as_u16(), "request completed");
        response
    }
    .instrument(span)
    .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Run a user store call on the blocking thread pool.
///
/// Both stores take locks and the file store reads and writes the whole
/// table, so calls never run on a runtime worker.
pub async fn blocking_store<T, F>(store: &Arc<dyn UserStore>, op: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn UserStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| StoreError::ReadError(format!("user store task failed: {}", e)))?
}

/// Resolve the session cookie in `headers` to a stored user.
///
/// A missing, forged or stale cookie yields `Ok(None)`.
pub async fn session_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<User>, StoreError> {
    let user_id = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| cookie_value(header, SESSION_COOKIE))
        .and_then(|value| state.sessions.verify(value));

    match user_id {
        Some(id) => blocking_store(&state.store, move |store| store.get(id)).await,
        None => Ok(None),
    }
}

/// Let the request through only with a valid session.
///
/// Unauthenticated requests are redirected to [`LOGGED_OUT_PATH`].
pub async fn require_login(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match session_user(&state, request.headers()).await {
        Ok(Some(user)) => {
            tracing::debug!(user_id = user.id, login = user.login(), "session accepted");
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Ok(None) => Redirect::to(LOGGED_OUT_PATH).into_response(),
        Err(e) => AppError::Store(e).into_response(),
    }
}
