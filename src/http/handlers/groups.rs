//! `/groups` handlers.

use axum::{
    body::Bytes,
    extract::State,
    Json,
};
use serde_json::{json, Value};

use crate::api::{ApiError, Consolidation, Group, Timer, TimerQuery};
use crate::http::request::{json_fields, ApiPath, ApiQuery};
use crate::http::server::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Group>> {
    Ok(Json(state.api.groups().all().await?))
}

pub async fn names(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(Json(state.api.groups().names().await?))
}

pub async fn create(State(state): State<AppState>, ApiPath(name): ApiPath<String>, body: Bytes) -> ApiResult<Group> {
    let fields = json_fields(&body)?;
    Ok(Json(state.api.groups().create(&name, fields).await?))
}

pub async fn get(State(state): State<AppState>, ApiPath(name): ApiPath<String>) -> ApiResult<Group> {
    Ok(Json(state.api.groups().get(&name).await?))
}

pub async fn update(State(state): State<AppState>, ApiPath(name): ApiPath<String>, body: Bytes) -> ApiResult<Group> {
    let fields = json_fields(&body)?;
    Ok(Json(state.api.groups().update(&name, fields).await?))
}

pub async fn remove(State(state): State<AppState>, ApiPath(name): ApiPath<String>) -> ApiResult<Value> {
    let removed = state.api.groups().remove(&name).await?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn timers(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    ApiQuery(query): ApiQuery<TimerQuery>,
) -> ApiResult<Vec<Timer>> {
    let timers = state.api.groups().timers(&name).await?;
    Ok(Json(timers.into_iter().filter(|t| query.matches(t)).collect()))
}

pub async fn running_timers(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    ApiQuery(query): ApiQuery<TimerQuery>,
) -> ApiResult<Vec<Timer>> {
    let timers = state.api.groups().running_timers(&name).await?;
    Ok(Json(timers.into_iter().filter(|t| query.matches(t)).collect()))
}

pub async fn consolidate(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    ApiQuery(query): ApiQuery<TimerQuery>,
) -> ApiResult<Consolidation> {
    Ok(Json(state.api.groups().consolidate(&name, query.predicate()).await?))
}
