use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::resume::ResumeEntryRow;
use crate::resume::assembly::{load_resume, ResumeAggregate};
use crate::resume::models::{Section, SectionData};
use crate::resume::sections;
use crate::resume::validation::validate_section;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SectionResponse {
    Single(ResumeEntryRow),
    List(Vec<ResumeEntryRow>),
}

fn parse_section(slug: &str) -> Result<Section, AppError> {
    Section::parse(slug).ok_or_else(|| AppError::NotFound(format!("Resume section '{slug}'")))
}

/// Parses the body into the section's typed shape, validates it, and
/// returns the normalized JSON to store.
pub fn parse_payload(section: Section, body: Value) -> Result<Value, AppError> {
    let data = SectionData::from_json(section, body)
        .map_err(|e| AppError::Validation(format!("Invalid {} payload: {e}", section.slug())))?;
    validate_section(&data).map_err(AppError::Validation)?;
    Ok(data.to_json())
}

fn require_list(section: Section) -> Result<(), AppError> {
    if section.is_singleton() {
        return Err(AppError::Validation(format!(
            "Section '{}' holds a single record; use PUT /api/v1/resume/{}",
            section.slug(),
            section.slug()
        )));
    }
    Ok(())
}

/// GET /api/v1/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ResumeAggregate>, AppError> {
    Ok(Json(load_resume(&state.db, user.id).await?))
}

/// GET /api/v1/resume/:section
pub async fn handle_get_section(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<SectionResponse>, AppError> {
    let section = parse_section(&slug)?;
    let mut rows = sections::list_entries(&state.db, user.id, section).await?;

    if section.is_singleton() {
        let row = rows
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("{} of user {}", section.slug(), user.id)))?;
        return Ok(Json(SectionResponse::Single(row)));
    }
    Ok(Json(SectionResponse::List(rows)))
}

/// PUT /api/v1/resume/:section
/// Upserts a singleton section (personal-info, contact-info).
pub async fn handle_upsert_section(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<ResumeEntryRow>, AppError> {
    let section = parse_section(&slug)?;
    if !section.is_singleton() {
        return Err(AppError::Validation(format!(
            "Section '{}' holds a list; use POST to add entries",
            section.slug()
        )));
    }
    let data = parse_payload(section, body)?;
    let row = sections::upsert_singleton(&state.db, user.id, section, &data).await?;
    info!("User {} saved {}", user.id, section.as_str());
    Ok(Json(row))
}

/// POST /api/v1/resume/:section
pub async fn handle_create_entry(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ResumeEntryRow>), AppError> {
    let section = parse_section(&slug)?;
    require_list(section)?;
    let data = parse_payload(section, body)?;
    let row = sections::create_entry(&state.db, user.id, section, &data).await?;
    info!("User {} added {} entry {}", user.id, section.as_str(), row.id);
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/v1/resume/:section/:id
pub async fn handle_update_entry(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((slug, entry_id)): Path<(String, i64)>,
    Json(body): Json<Value>,
) -> Result<Json<ResumeEntryRow>, AppError> {
    let section = parse_section(&slug)?;
    require_list(section)?;
    let data = parse_payload(section, body)?;
    let row = sections::update_entry(&state.db, user.id, section, entry_id, &data)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} entry {entry_id}", section.slug())))?;
    Ok(Json(row))
}

/// DELETE /api/v1/resume/:section/:id
pub async fn handle_delete_entry(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((slug, entry_id)): Path<(String, i64)>,
) -> Result<StatusCode, AppError> {
    let section = parse_section(&slug)?;
    require_list(section)?;
    if !sections::delete_entry(&state.db, user.id, section, entry_id).await? {
        return Err(AppError::NotFound(format!(
            "{} entry {entry_id}",
            section.slug()
        )));
    }
    info!("User {} deleted {} entry {entry_id}", user.id, section.as_str());
    Ok(StatusCode::NO_CONTENT)
}
