//! Wallet top-up charges.
//!
//! A charge is created `pending` by its owner and reviewed exactly once by an
//! admin. Accepting credits the owner's balance in the same transaction that
//! flips the status; rejecting only flips the status. Terminal states never
//! change again.

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::files::{object_key, FileStore, Upload};
use crate::ledger::{max_money, validate_amount, LedgerError};
use crate::models::wallet::{ChargeFilter, ChargeStatus, WalletCharge};
use crate::store::{LedgerStore, Page};

const RECEIPT_PREFIX: &str = "wallet_receipts";

/// Validates the amount, stores the receipt, and records a pending charge.
/// The balance is not touched until an admin accepts the charge.
pub async fn submit_charge(
    ledger: &dyn LedgerStore,
    files: &dyn FileStore,
    user_id: i64,
    amount: Decimal,
    receipt: Upload,
) -> Result<WalletCharge, LedgerError> {
    let amount = validate_amount(amount)?;
    if receipt.bytes.is_empty() {
        return Err(LedgerError::Validation(
            "A receipt file is required".to_string(),
        ));
    }
    ledger
        .get_user(user_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("User {user_id}")))?;

    let key = object_key(RECEIPT_PREFIX, user_id, &receipt.file_name);
    let receipt_ref = files.put(&key, &receipt.content_type, receipt.bytes).await?;
    let charge = ledger.create_charge(user_id, amount, &receipt_ref).await?;

    info!(
        "User {user_id} submitted wallet charge {} for {amount}",
        charge.id
    );
    Ok(charge)
}

/// Flips a pending charge to accepted and credits the owner, atomically.
pub async fn accept_charge(
    ledger: &dyn LedgerStore,
    charge_id: i64,
) -> Result<WalletCharge, LedgerError> {
    let mut tx = ledger.begin().await?;

    let charge = tx
        .lock_charge_for_update(charge_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("Charge {charge_id}")))?;
    ensure_pending(&charge, "accepted")?;

    let user = tx
        .lock_user_for_update(charge.user_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("User {}", charge.user_id)))?;

    if user.wallet_balance + charge.amount > max_money() {
        warn!(
            "Refused to accept wallet charge {charge_id}: balance {} + {} exceeds {}",
            user.wallet_balance,
            charge.amount,
            max_money()
        );
        return Err(LedgerError::Validation(format!(
            "Accepting charge {charge_id} would exceed the maximum wallet balance of {}",
            max_money()
        )));
    }

    tx.adjust_balance(user.id, charge.amount).await?;
    tx.set_charge_status(charge.id, ChargeStatus::Accepted)
        .await?;
    tx.commit().await?;

    info!(
        "Accepted wallet charge {charge_id}: user {} balance {} -> {}",
        user.id,
        user.wallet_balance,
        user.wallet_balance + charge.amount
    );
    Ok(WalletCharge {
        status: ChargeStatus::Accepted,
        ..charge
    })
}

/// Flips a pending charge to rejected. No balance effect.
pub async fn reject_charge(
    ledger: &dyn LedgerStore,
    charge_id: i64,
) -> Result<WalletCharge, LedgerError> {
    let mut tx = ledger.begin().await?;

    let charge = tx
        .lock_charge_for_update(charge_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("Charge {charge_id}")))?;
    ensure_pending(&charge, "rejected")?;

    tx.set_charge_status(charge.id, ChargeStatus::Rejected)
        .await?;
    tx.commit().await?;

    info!("Rejected wallet charge {charge_id} of user {}", charge.user_id);
    Ok(WalletCharge {
        status: ChargeStatus::Rejected,
        ..charge
    })
}

pub async fn get_charge(
    ledger: &dyn LedgerStore,
    charge_id: i64,
) -> Result<WalletCharge, LedgerError> {
    ledger
        .get_charge(charge_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("Charge {charge_id}")))
}

/// Newest first. `filter.user_id = None` lists every user's charges.
pub async fn list_charges(
    ledger: &dyn LedgerStore,
    filter: &ChargeFilter,
    page: Page,
) -> Result<Vec<WalletCharge>, LedgerError> {
    page.check().map_err(LedgerError::Validation)?;
    Ok(ledger.list_charges(filter, page).await?)
}

pub async fn get_balance(ledger: &dyn LedgerStore, user_id: i64) -> Result<Decimal, LedgerError> {
    let user = ledger
        .get_user(user_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("User {user_id}")))?;
    Ok(user.wallet_balance)
}

fn ensure_pending(charge: &WalletCharge, action: &'static str) -> Result<(), LedgerError> {
    if charge.status.is_terminal() {
        warn!(
            "Refusing to mark charge {} {action}: already {}",
            charge.id, charge.status
        );
        return Err(LedgerError::InvalidState {
            charge_id: charge.id,
            status: charge.status,
            action,
        });
    }
    Ok(())
}
