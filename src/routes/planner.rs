use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::PrivateCookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    config::MapConfig,
    error::AppError,
    models::{
        draft::{DraftField, DraftForm},
        trip::{Coordinate, Trip},
    },
    planner::{PlannerError, TripPlanner},
    session::current_session,
    state::AppState,
};

const PENDING_PIN_POPUP: &str = "Trip location";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/pins", post(add_pin))
        .route("/draft", post(change_draft))
        .route("/trips", post(save_trip))
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    show_alert: bool,
    alert_message: String,
    draft: DraftForm,
    trips: Vec<TripSummary>,
    map_json: String,
}

#[derive(Clone)]
struct TripSummary {
    name: String,
    date: String,
    duration: String,
    description: String,
}

impl From<&Trip> for TripSummary {
    fn from(trip: &Trip) -> Self {
        Self {
            name: trip.name.clone(),
            date: trip.date.clone(),
            duration: trip.duration.clone(),
            description: trip.description.clone(),
        }
    }
}

/// Everything the Leaflet widget needs, embedded into the page as JSON.
#[derive(Debug, Serialize)]
struct MapView<'a> {
    center: Coordinate,
    zoom: u8,
    tile_url: &'a str,
    markers: Vec<MarkerView>,
}

#[derive(Debug, Serialize)]
struct MarkerView {
    position: Coordinate,
    popup: String,
    draggable: bool,
}

impl<'a> MapView<'a> {
    fn new(map: &'a MapConfig, planner: &TripPlanner) -> Self {
        let pending = planner.pending_pins().iter().map(|pin| MarkerView {
            position: *pin,
            popup: PENDING_PIN_POPUP.to_string(),
            draggable: true,
        });
        let saved = planner.trips().iter().map(|trip| MarkerView {
            position: trip.location,
            popup: trip.name.clone(),
            draggable: false,
        });
        Self {
            center: map.center,
            zoom: map.zoom,
            tile_url: &map.tile_url,
            markers: pending.chain(saved).collect(),
        }
    }
}

fn render_page(
    map: &MapConfig,
    planner: &TripPlanner,
    alert: Option<&PlannerError>,
) -> Result<IndexTemplate, AppError> {
    let map_json = script_json(&MapView::new(map, planner))?;
    Ok(IndexTemplate {
        show_alert: alert.is_some(),
        alert_message: alert.map(ToString::to_string).unwrap_or_default(),
        draft: planner.draft().clone(),
        trips: planner.trips().iter().map(TripSummary::from).collect(),
        map_json,
    })
}

/// Serializes for a `<script type="application/json">` block; `<` is
/// escaped so popup text can never close the element.
fn script_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    let raw = serde_json::to_string(value).map_err(|err| AppError::Other(err.into()))?;
    Ok(raw.replace('<', "\\u003c"))
}

async fn index(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<Response, AppError> {
    let (jar, session) = current_session(&state, jar).await;
    let page = state
        .sessions
        .read(&session, |planner| render_page(&state.config.map, planner, None))
        .await?;
    Ok((jar, AskamaTemplateResponse::into_response(page)).into_response())
}

#[derive(Deserialize)]
struct PinForm {
    latitude: f64,
    longitude: f64,
}

async fn add_pin(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<PinForm>,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    let coordinate = Coordinate::new(form.latitude, form.longitude);
    if !coordinate.is_within_bounds() {
        return Err(AppError::BadRequest(format!(
            "coordinate {coordinate} is outside the map"
        )));
    }
    let (jar, session) = current_session(&state, jar).await;
    let pending = state
        .sessions
        .update(&session, |planner| {
            planner.add_marker(coordinate);
            planner.pending_pins().len()
        })
        .await;
    debug!(session = %session, %coordinate, pending, "pin dropped");
    Ok((jar, Redirect::to("/")))
}

#[derive(Deserialize)]
struct DraftChange {
    field: String,
    #[serde(default)]
    value: String,
}

async fn change_draft(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(change): Form<DraftChange>,
) -> Result<(PrivateCookieJar, StatusCode), AppError> {
    let field: DraftField = change.field.parse()?;
    let (jar, session) = current_session(&state, jar).await;
    state
        .sessions
        .update(&session, |planner| planner.handle_input_change(field, change.value))
        .await;
    Ok((jar, StatusCode::NO_CONTENT))
}

/// Fields missing from the body leave the draft as it is.
#[derive(Deserialize)]
struct TripForm {
    name: Option<String>,
    date: Option<String>,
    duration: Option<String>,
    description: Option<String>,
}

impl TripForm {
    fn into_changes(self) -> impl Iterator<Item = (DraftField, String)> {
        [
            (DraftField::Name, self.name),
            (DraftField::Date, self.date),
            (DraftField::Duration, self.duration),
            (DraftField::Description, self.description),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field, value)))
    }
}

async fn save_trip(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<TripForm>,
) -> Result<Response, AppError> {
    let (jar, session) = current_session(&state, jar).await;
    let map = &state.config.map;

    let outcome = state
        .sessions
        .update(&session, |planner| {
            for (field, value) in form.into_changes() {
                planner.handle_input_change(field, value);
            }
            match planner.handle_submit(Utc::now()) {
                Ok(trip) => Ok(Ok((trip.id, trip.location))),
                Err(err @ PlannerError::MissingLocation) => {
                    render_page(map, planner, Some(&err)).map(Err)
                }
                Err(err) => Err(AppError::from(err)),
            }
        })
        .await?;

    match outcome {
        Ok((id, location)) => {
            info!(session = %session, trip = id, %location, "trip saved");
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(page) => {
            warn!(session = %session, "trip rejected: no location selected");
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                jar,
                AskamaTemplateResponse::into_response(page),
            )
                .into_response())
        }
    }
}
