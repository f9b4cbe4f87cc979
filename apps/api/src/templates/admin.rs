use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::template::{Template, TemplateFilter, TemplatePatch};
use crate::state::AppState;
use crate::store::TemplateCatalog;
use crate::templates::validation::{self, TemplateInput, TemplateUpdateInput};
use crate::templates::TemplateListQuery;

#[derive(Debug, Deserialize)]
pub struct SortOrderQuery {
    pub sort_order: i32,
}

async fn find(catalog: &dyn TemplateCatalog, template_id: i64) -> Result<Template, AppError> {
    catalog
        .get_template(template_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {template_id}")))
}

async fn apply(
    catalog: &dyn TemplateCatalog,
    template_id: i64,
    patch: &TemplatePatch,
) -> Result<Template, AppError> {
    if let Some(name) = patch.name.as_deref() {
        if let Some(other) = catalog.get_template_by_name(name).await? {
            if other.id != template_id {
                return Err(AppError::Conflict(format!(
                    "Template name '{name}' is already taken"
                )));
            }
        }
    }
    let template = catalog
        .update_template(template_id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {template_id}")))?;
    info!("Updated template {template_id}");
    Ok(template)
}

/// POST /api/v1/admin/templates
pub async fn handle_create_template(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<TemplateInput>,
) -> Result<(StatusCode, Json<Template>), AppError> {
    let new = input.validate()?;
    if state.catalog.get_template_by_name(&new.name).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Template name '{}' is already taken",
            new.name
        )));
    }
    let template = state.catalog.create_template(&new).await?;
    info!("Created template {} ({})", template.id, template.name);
    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /api/v1/admin/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<TemplateListQuery>,
) -> Result<Json<Vec<Template>>, AppError> {
    let page = query.page();
    page.check().map_err(AppError::Validation)?;
    let filter = TemplateFilter {
        enabled_only: query.enabled_only,
        category: query.category,
    };
    Ok(Json(state.catalog.list_templates(&filter, page).await?))
}

/// GET /api/v1/admin/templates/:id
pub async fn handle_get_template(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(template_id): Path<i64>,
) -> Result<Json<Template>, AppError> {
    Ok(Json(find(state.catalog.as_ref(), template_id).await?))
}

/// PUT /api/v1/admin/templates/:id
pub async fn handle_update_template(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(template_id): Path<i64>,
    Json(input): Json<TemplateUpdateInput>,
) -> Result<Json<Template>, AppError> {
    let patch = input.validate()?;
    Ok(Json(apply(state.catalog.as_ref(), template_id, &patch).await?))
}

/// DELETE /api/v1/admin/templates/:id
pub async fn handle_delete_template(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(template_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.catalog.delete_template(template_id).await? {
        return Err(AppError::NotFound(format!("Template {template_id}")));
    }
    info!("Deleted template {template_id}");
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/admin/templates/:id/toggle-status
pub async fn handle_toggle_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(template_id): Path<i64>,
) -> Result<Json<Template>, AppError> {
    let current = find(state.catalog.as_ref(), template_id).await?;
    let patch = TemplatePatch {
        is_enabled: Some(!current.is_enabled),
        ..Default::default()
    };
    Ok(Json(apply(state.catalog.as_ref(), template_id, &patch).await?))
}

/// PATCH /api/v1/admin/templates/:id/sort-order?sort_order=
pub async fn handle_set_sort_order(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(template_id): Path<i64>,
    Query(query): Query<SortOrderQuery>,
) -> Result<Json<Template>, AppError> {
    let patch = TemplatePatch {
        sort_order: Some(validation::sort_order(query.sort_order)?),
        ..Default::default()
    };
    Ok(Json(apply(state.catalog.as_ref(), template_id, &patch).await?))
}
