use std::str::FromStr;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::forms::read_form;
use crate::ledger::wallet;
use crate::models::wallet::{ChargeFilter, WalletCharge};
use crate::state::AppState;
use crate::wallet::ChargeListQuery;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Decimal,
}

/// GET /api/v1/wallet/balance
pub async fn handle_get_balance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = wallet::get_balance(state.ledger.as_ref(), user.id).await?;
    Ok(Json(BalanceResponse { balance }))
}

/// POST /api/v1/wallet/charges
/// multipart/form-data: amount (decimal text), receipt (file)
pub async fn handle_submit_charge(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<WalletCharge>), AppError> {
    let mut form = read_form(multipart, state.config.max_upload_bytes).await?;

    let amount = form
        .text("amount")
        .ok_or_else(|| AppError::Validation("amount is required".to_string()))?;
    let amount = Decimal::from_str(amount)
        .map_err(|_| AppError::Validation("amount must be a decimal number".to_string()))?;
    let receipt = form
        .take_file("receipt")
        .ok_or_else(|| AppError::Validation("receipt file is required".to_string()))?;

    let charge = wallet::submit_charge(
        state.ledger.as_ref(),
        state.files.as_ref(),
        user.id,
        amount,
        receipt,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(charge)))
}

/// GET /api/v1/wallet/charges
pub async fn handle_list_my_charges(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ChargeListQuery>,
) -> Result<Json<Vec<WalletCharge>>, AppError> {
    let filter = ChargeFilter {
        user_id: Some(user.id),
        status: query.status,
    };
    let charges = wallet::list_charges(state.ledger.as_ref(), &filter, query.page()).await?;
    Ok(Json(charges))
}
