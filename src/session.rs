use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    PrivateCookieJar,
};
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "trip_session";

/// Finds the planner session for this browser, minting a new id when the
/// cookie is missing. The id is only stored once the session changes state.
pub async fn current_session(
    state: &AppState,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return (jar, cookie.value().to_string());
    }
    let id = Uuid::new_v4().to_string();
    let stored = state.sessions.len().await;
    debug!(session = %id, stored, "new browser session");
    (apply_session_cookie(jar, &id), id)
}

pub fn apply_session_cookie(jar: PrivateCookieJar, session_id: &str) -> PrivateCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}
