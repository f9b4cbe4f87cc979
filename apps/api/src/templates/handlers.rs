use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::ledger::purchase;
use crate::models::template::{Template, TemplateView};
use crate::state::AppState;
use crate::templates::TemplateListQuery;

/// GET /api/v1/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TemplateListQuery>,
) -> Result<Json<Vec<TemplateView>>, AppError> {
    let page = query.page();
    let templates = purchase::list_templates_for_user(
        state.catalog.as_ref(),
        state.entitlements.as_ref(),
        user.id,
        query.category,
        page,
    )
    .await?;
    Ok(Json(templates))
}

/// GET /api/v1/templates/purchased
pub async fn handle_list_purchased(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Template>>, AppError> {
    let templates = purchase::list_purchased_templates(
        state.catalog.as_ref(),
        state.entitlements.as_ref(),
        user.id,
    )
    .await?;
    Ok(Json(templates))
}

/// POST /api/v1/templates/:id/purchase
pub async fn handle_purchase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(template_id): Path<i64>,
) -> Result<Json<TemplateView>, AppError> {
    let view = purchase::purchase_template(
        state.ledger.as_ref(),
        state.catalog.as_ref(),
        state.entitlements.as_ref(),
        user.id,
        template_id,
    )
    .await?;
    Ok(Json(view))
}
