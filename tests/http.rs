use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use kayak_planner::{
    config::AppConfig, routes::create_router, session::SESSION_COOKIE, state::AppState,
};
use serde_json::Value;
use tower::ServiceExt;

fn state_with(pairs: &'static [(&'static str, &'static str)]) -> AppState {
    let config = AppConfig::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .expect("test config should be valid");
    AppState::new(config)
}

fn app_with(pairs: &'static [(&'static str, &'static str)]) -> Router {
    create_router(state_with(pairs))
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    body: String,
}

async fn send(app: &Router, method: &str, uri: &str, cookie: Option<&str>, form: &str) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if method == "POST" {
        builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    }
    let resp = app
        .clone()
        .oneshot(
            builder
                .body(Body::from(form.to_string()))
                .expect("request build should succeed"),
        )
        .await
        .expect("app should handle request");

    let status = resp.status();
    let cookie = resp
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(SESSION_COOKIE))
        .and_then(|value| value.split(';').next())
        .map(str::to_string);
    let body = to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .expect("response body should be readable");
    let body = String::from_utf8(body.to_vec()).expect("response body must be utf-8");
    Reply {
        status,
        cookie,
        body,
    }
}

async fn open_session(app: &Router) -> String {
    let reply = send(app, "GET", "/", None, "").await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.cookie.expect("first visit should set a session cookie")
}

async fn snapshot(app: &Router, cookie: &str) -> Value {
    let reply = send(app, "GET", "/api/state", Some(cookie), "").await;
    assert_eq!(reply.status, StatusCode::OK);
    serde_json::from_str(&reply.body).expect("state should be json")
}

#[tokio::test]
async fn empty_page_renders_the_planner() {
    let app = app_with(&[]);
    let reply = send(&app, "GET", "/", None, "").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Kayaking Trip Planner"));
    assert!(reply.body.contains("No trips saved yet."));
    assert!(reply.body.contains(r#""zoom":13"#));
    assert!(reply.cookie.is_some());
}

#[tokio::test]
async fn click_fill_and_save_a_trip() {
    let app = app_with(&[]);
    let cookie = open_session(&app).await;

    let pin = send(&app, "POST", "/pins", Some(cookie.as_str()), "latitude=51.51&longitude=-0.08").await;
    assert_eq!(pin.status, StatusCode::SEE_OTHER);

    let draft = send(&app, "POST", "/draft", Some(cookie.as_str()), "field=name&value=Draft+Name").await;
    assert_eq!(draft.status, StatusCode::NO_CONTENT);
    assert_eq!(snapshot(&app, &cookie).await["draft"]["name"], "Draft Name");

    let saved = send(
        &app,
        "POST",
        "/trips",
        Some(cookie.as_str()),
        "name=Thames+Loop&date=2024-06-01&duration=3&description=Evening+paddle",
    )
    .await;
    assert_eq!(saved.status, StatusCode::SEE_OTHER);

    let state = snapshot(&app, &cookie).await;
    assert_eq!(state["pending_pins"].as_array().unwrap().len(), 0);
    assert_eq!(state["draft"]["name"], "");
    let trips = state["trips"].as_array().unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0]["name"], "Thames Loop");
    assert_eq!(trips[0]["location"]["latitude"], 51.51);
    assert_eq!(trips[0]["location"]["longitude"], -0.08);

    let page = send(&app, "GET", "/", Some(cookie.as_str()), "").await;
    assert!(page.body.contains("Duration: 3 hours"));
    assert!(page.body.contains("Evening paddle"));
}

#[tokio::test]
async fn saving_without_a_pin_is_rejected_and_keeps_the_draft() {
    let app = app_with(&[]);
    let cookie = open_session(&app).await;

    let reply = send(
        &app,
        "POST",
        "/trips",
        Some(cookie.as_str()),
        "name=Nowhere&date=2024-08-01&duration=1&description=No+pin",
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.body.contains("Please select a location on the map."));
    assert!(reply.body.contains(r#"value="Nowhere""#));

    let state = snapshot(&app, &cookie).await;
    assert!(state["trips"].as_array().unwrap().is_empty());
    assert_eq!(state["draft"]["name"], "Nowhere");
}

#[tokio::test]
async fn sessions_are_isolated() {
    let app = app_with(&[]);
    let first = open_session(&app).await;
    let second = open_session(&app).await;
    assert_ne!(first, second);

    send(&app, "POST", "/pins", Some(first.as_str()), "latitude=10&longitude=10").await;

    let first_pins = snapshot(&app, &first).await["pending_pins"].clone();
    let second_pins = snapshot(&app, &second).await["pending_pins"].clone();
    assert_eq!(first_pins.as_array().unwrap().len(), 1);
    assert!(second_pins.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn replace_mode_is_configurable() {
    let app = app_with(&[("PIN_MODE", "replace")]);
    let cookie = open_session(&app).await;

    send(&app, "POST", "/pins", Some(cookie.as_str()), "latitude=10&longitude=10").await;
    send(&app, "POST", "/pins", Some(cookie.as_str()), "latitude=20&longitude=20").await;

    let state = snapshot(&app, &cookie).await;
    assert_eq!(state["pin_mode"], "replace");
    let pins = state["pending_pins"].as_array().unwrap();
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0]["latitude"], 20.0);
}

#[tokio::test]
async fn bad_requests_are_reported() {
    let app = app_with(&[]);
    let cookie = open_session(&app).await;

    let field = send(&app, "POST", "/draft", Some(cookie.as_str()), "field=location&value=x").await;
    assert_eq!(field.status, StatusCode::BAD_REQUEST);

    let pin = send(&app, "POST", "/pins", Some(cookie.as_str()), "latitude=95&longitude=0").await;
    assert_eq!(pin.status, StatusCode::BAD_REQUEST);

    let state = snapshot(&app, &cookie).await;
    assert!(state["pending_pins"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_submit_with_missing_fields_keeps_the_draft() {
    let app = app_with(&[]);
    let cookie = open_session(&app).await;

    send(&app, "POST", "/draft", Some(cookie.as_str()), "field=name&value=Keep+Me").await;
    send(&app, "POST", "/draft", Some(cookie.as_str()), "field=duration&value=2").await;

    let empty = send(&app, "POST", "/trips", Some(cookie.as_str()), "").await;
    assert_eq!(empty.status, StatusCode::UNPROCESSABLE_ENTITY);

    let partial = send(&app, "POST", "/trips", Some(cookie.as_str()), "date=2024-06-01").await;
    assert_eq!(partial.status, StatusCode::UNPROCESSABLE_ENTITY);

    let draft = snapshot(&app, &cookie).await["draft"].clone();
    assert_eq!(draft["name"], "Keep Me");
    assert_eq!(draft["duration"], "2");
    assert_eq!(draft["date"], "2024-06-01");
    assert_eq!(draft["description"], "");
}

#[tokio::test]
async fn cookieless_reads_do_not_store_sessions() {
    let state = state_with(&[]);
    let app = create_router(state.clone());

    for _ in 0..25 {
        let page = send(&app, "GET", "/", None, "").await;
        assert_eq!(page.status, StatusCode::OK);
        let api = send(&app, "GET", "/api/state", None, "").await;
        assert_eq!(api.status, StatusCode::OK);
    }
    assert_eq!(state.sessions.len().await, 0);

    let cookie = open_session(&app).await;
    send(&app, "POST", "/pins", Some(cookie.as_str()), "latitude=1&longitude=1").await;
    assert_eq!(state.sessions.len().await, 1);
}

#[tokio::test]
async fn map_popups_are_bound_as_text() {
    let app = app_with(&[]);
    let script = send(&app, "GET", "/static/planner.js", None, "").await;

    assert_eq!(script.status, StatusCode::OK);
    assert!(script.body.contains("document.createTextNode(marker.popup)"));
    assert!(!script.body.contains(".bindPopup(marker.popup)"));
}
