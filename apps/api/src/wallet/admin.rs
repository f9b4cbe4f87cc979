use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::ledger::wallet;
use crate::models::wallet::{ChargeFilter, WalletCharge};
use crate::state::AppState;
use crate::wallet::ChargeListQuery;

/// GET /api/v1/admin/wallet/charges
pub async fn handle_list_charges(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ChargeListQuery>,
) -> Result<Json<Vec<WalletCharge>>, AppError> {
    let filter = ChargeFilter {
        user_id: query.user_id,
        status: query.status,
    };
    let charges = wallet::list_charges(state.ledger.as_ref(), &filter, query.page()).await?;
    Ok(Json(charges))
}

/// GET /api/v1/admin/wallet/charges/:id
pub async fn handle_get_charge(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(charge_id): Path<i64>,
) -> Result<Json<WalletCharge>, AppError> {
    Ok(Json(wallet::get_charge(state.ledger.as_ref(), charge_id).await?))
}

/// POST /api/v1/admin/wallet/charges/:id/accept
pub async fn handle_accept_charge(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(charge_id): Path<i64>,
) -> Result<Json<WalletCharge>, AppError> {
    Ok(Json(wallet::accept_charge(state.ledger.as_ref(), charge_id).await?))
}

/// POST /api/v1/admin/wallet/charges/:id/reject
pub async fn handle_reject_charge(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(charge_id): Path<i64>,
) -> Result<Json<WalletCharge>, AppError> {
    Ok(Json(wallet::reject_charge(state.ledger.as_ref(), charge_id).await?))
}
