use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use geojson::FeatureCollection;
use serde::Deserialize;
use serde_json::{json, Value};
use travel_log_data_management::route::MapRenderer;
use travel_log_lib::{
    checklist::Checklist,
    settings::{AppSettings, EmergencyContact, SettingsUpdate},
    stats::{RouteAnalytics, TravelStats},
    PositionSample, ShareSummary, SourceEvent, Trip, TripDetails,
};

use crate::{
    error::ApiError,
    server_state::ServerState,
    suggestions::Place,
    tracking::{EndReport, LiveMetrics},
};

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/trips", get(list_trips))
        .route("/trip/{trip_id}", get(get_trip).put(update_trip).delete(delete_trip))
        .route("/trip/{trip_id}/route", get(get_trip_route))
        .route("/trip/{trip_id}/gpx", get(get_trip_gpx))
        .route("/trip/{trip_id}/share", get(share_trip))
        .route("/stats", get(get_stats))
        .route("/analytics", get(get_analytics))
        .route("/session", get(get_session))
        .route("/session/route", get(get_session_route))
        .route("/session/start", post(start_session))
        .route("/session/end", post(end_session))
        .route("/session/sample", post(ingest_sample))
        .route("/position", post(post_position))
        .route("/suggestions/activity", get(suggest_activities))
        .route("/suggestions/nearby", get(nearby_places))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/consent", get(get_consent).post(give_consent))
        .route("/checklists", get(list_checklists).post(create_checklist))
        .route("/checklist/{checklist_id}", delete(delete_checklist))
        .route("/checklist/{checklist_id}/items", post(add_checklist_item))
        .route("/checklist/{checklist_id}/items/{item_id}", post(toggle_checklist_item).delete(remove_checklist_item))
        .route("/contacts", get(list_contacts).post(add_contact))
        .route("/contact/{contact_id}", delete(remove_contact))
        .with_state(state)
}

// Trips

async fn list_trips(State(state): State<Arc<ServerState>>) -> ApiResult<Vec<Trip>> {
    Ok(Json(state.data_manager.get_trips().await?))
}

async fn get_trip(State(state): State<Arc<ServerState>>, Path(trip_id): Path<String>) -> ApiResult<Trip> {
    Ok(Json(state.data_manager.get_trip(&trip_id).await?))
}

async fn update_trip(
    State(state): State<Arc<ServerState>>,
    Path(trip_id): Path<String>,
    Json(details): Json<TripDetails>,
) -> ApiResult<Trip> {
    let trip = state.data_manager.update_trip(&trip_id, details).await?;
    tracing::info!("Updated trip {}", trip_id);
    Ok(Json(trip))
}

async fn delete_trip(State(state): State<Arc<ServerState>>, Path(trip_id): Path<String>) -> Result<StatusCode, ApiError> {
    state.data_manager.delete_trip(&trip_id).await?;
    tracing::info!("Deleted trip {}", trip_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn get_trip_route(State(state): State<Arc<ServerState>>, Path(trip_id): Path<String>) -> ApiResult<FeatureCollection> {
    let trip = state.data_manager.get_trip(&trip_id).await?;
    Ok(Json(state.renderer.render(trip.path_points(), None)))
}

async fn get_trip_gpx(State(state): State<Arc<ServerState>>, Path(trip_id): Path<String>) -> Result<Response, ApiError> {
    let mut buf = Vec::new();
    state.data_manager.export_gpx(&trip_id, &mut buf).await?;

    let disposition = format!("attachment; filename=\"trip-{}.gpx\"", trip_id.replace(':', "-"));
    Ok((
        [(header::CONTENT_TYPE, "application/gpx+xml".to_string()), (header::CONTENT_DISPOSITION, disposition)],
        buf,
    )
        .into_response())
}

async fn share_trip(State(state): State<Arc<ServerState>>, Path(trip_id): Path<String>) -> ApiResult<ShareSummary> {
    Ok(Json(state.data_manager.get_trip(&trip_id).await?.share_summary()))
}

async fn get_stats(State(state): State<Arc<ServerState>>) -> ApiResult<TravelStats> {
    Ok(Json(state.data_manager.travel_stats().await?))
}

#[derive(Deserialize)]
struct RouteQuery {
    origin: String,
    destination: String,
}

async fn get_analytics(State(state): State<Arc<ServerState>>, Query(query): Query<RouteQuery>) -> ApiResult<RouteAnalytics> {
    state.data_manager.route_analytics(&query.origin, &query.destination).await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No past trips found for this route."))
}

// Live session

async fn get_session(State(state): State<Arc<ServerState>>) -> Json<LiveMetrics> {
    Json(state.tracker.metrics())
}

async fn get_session_route(State(state): State<Arc<ServerState>>) -> ApiResult<FeatureCollection> {
    let path = state.tracker.path().await?;
    let live = state.tracker.metrics().position;
    Ok(Json(state.renderer.render(&path, live)))
}

async fn start_session(State(state): State<Arc<ServerState>>, Json(details): Json<TripDetails>) -> ApiResult<Trip> {
    let settings = state.data_manager.get_settings().await?;
    Ok(Json(state.tracker.start(details, settings.location_enabled).await?))
}

async fn end_session(State(state): State<Arc<ServerState>>) -> ApiResult<EndReport> {
    Ok(Json(state.tracker.end().await?))
}

async fn ingest_sample(State(state): State<Arc<ServerState>>, Json(sample): Json<PositionSample>) -> ApiResult<Value> {
    let distance_km = state.tracker.ingest(sample).await?;
    Ok(Json(json!({ "distanceKm": distance_km })))
}

/// Geolocation events from a device. Dropped unless a session is listening.
async fn post_position(State(state): State<Arc<ServerState>>, Json(event): Json<SourceEvent>) -> (StatusCode, Json<Value>) {
    let delivered = state.source.publish(event).await;
    (StatusCode::ACCEPTED, Json(json!({ "delivered": delivered })))
}

// Suggestions

async fn suggest_activities(State(state): State<Arc<ServerState>>, Query(query): Query<RouteQuery>) -> Json<Vec<String>> {
    Json(state.suggestions.suggest_activities(&query.origin, &query.destination).await)
}

#[derive(Deserialize)]
struct LocationQuery {
    latitude: f64,
    longitude: f64,
}

async fn nearby_places(State(state): State<Arc<ServerState>>, Query(query): Query<LocationQuery>) -> Json<Vec<Place>> {
    Json(state.suggestions.nearby_places(query.latitude, query.longitude).await)
}

// Settings and consent

async fn get_settings(State(state): State<Arc<ServerState>>) -> ApiResult<AppSettings> {
    Ok(Json(state.data_manager.get_settings().await?))
}

async fn update_settings(State(state): State<Arc<ServerState>>, Json(update): Json<SettingsUpdate>) -> ApiResult<AppSettings> {
    Ok(Json(state.data_manager.update_settings(update).await?))
}

async fn get_consent(State(state): State<Arc<ServerState>>) -> ApiResult<Value> {
    let consented = state.data_manager.has_consented().await?;
    Ok(Json(json!({ "consented": consented })))
}

async fn give_consent(State(state): State<Arc<ServerState>>) -> Result<StatusCode, ApiError> {
    state.data_manager.give_consent().await?;
    Ok(StatusCode::NO_CONTENT)
}

// Checklists

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

#[derive(Deserialize)]
struct TextBody {
    text: String,
}

async fn list_checklists(State(state): State<Arc<ServerState>>) -> ApiResult<Vec<Checklist>> {
    Ok(Json(state.data_manager.get_checklists().await?))
}

async fn create_checklist(State(state): State<Arc<ServerState>>, Json(body): Json<NameBody>) -> Result<(StatusCode, Json<Checklist>), ApiError> {
    let checklist = state.data_manager.create_checklist(&body.name).await?
        .ok_or_else(|| ApiError::bad_request("Checklist name must not be empty"))?;
    Ok((StatusCode::CREATED, Json(checklist)))
}

async fn delete_checklist(State(state): State<Arc<ServerState>>, Path(checklist_id): Path<String>) -> Result<StatusCode, ApiError> {
    state.data_manager.delete_checklist(&checklist_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_checklist_item(
    State(state): State<Arc<ServerState>>,
    Path(checklist_id): Path<String>,
    Json(body): Json<TextBody>,
) -> ApiResult<Checklist> {
    Ok(Json(state.data_manager.add_checklist_item(&checklist_id, &body.text).await?))
}

async fn toggle_checklist_item(
    State(state): State<Arc<ServerState>>,
    Path((checklist_id, item_id)): Path<(String, String)>,
) -> ApiResult<Checklist> {
    Ok(Json(state.data_manager.toggle_checklist_item(&checklist_id, &item_id).await?))
}

async fn remove_checklist_item(
    State(state): State<Arc<ServerState>>,
    Path((checklist_id, item_id)): Path<(String, String)>,
) -> ApiResult<Checklist> {
    Ok(Json(state.data_manager.remove_checklist_item(&checklist_id, &item_id).await?))
}

// Emergency contacts

#[derive(Deserialize)]
struct ContactBody {
    name: String,
    number: String,
}

async fn list_contacts(State(state): State<Arc<ServerState>>) -> ApiResult<Vec<EmergencyContact>> {
    Ok(Json(state.data_manager.get_contacts().await?))
}

async fn add_contact(State(state): State<Arc<ServerState>>, Json(body): Json<ContactBody>) -> Result<(StatusCode, Json<EmergencyContact>), ApiError> {
    if body.name.trim().is_empty() || body.number.trim().is_empty() {
        return Err(ApiError::bad_request("Name and number are required"));
    }
    let contact = state.data_manager.add_contact(&body.name, &body.number).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn remove_contact(State(state): State<Arc<ServerState>>, Path(contact_id): Path<String>) -> Result<StatusCode, ApiError> {
    state.data_manager.remove_contact(&contact_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
