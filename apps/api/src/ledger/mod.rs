//! Wallet ledger: top-up charges reviewed by admins, and template purchases
//! paid from the wallet balance.
//!
//! Only `wallet::accept_charge` and `purchase::purchase_template` write
//! `users.wallet_balance`, and both do it inside one `LedgerTx` holding the
//! user's row lock.

pub mod purchase;
pub mod wallet;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::files::FileStoreError;
use crate::models::wallet::ChargeStatus;
use crate::store::StoreError;

/// Money columns are NUMERIC(12, 2).
pub const MONEY_SCALE: u32 = 2;

/// Largest value a NUMERIC(12, 2) column holds: 9_999_999_999.99.
pub fn max_money() -> Decimal {
    Decimal::new(999_999_999_999, MONEY_SCALE)
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Charge {charge_id} is {status}; only pending charges can be {action}")]
    InvalidState {
        charge_id: i64,
        status: ChargeStatus,
        action: &'static str,
    },

    #[error("Template {template_id} is already purchased")]
    AlreadyPurchased { template_id: i64 },

    #[error("Insufficient funds: balance {balance}, price {price}")]
    InsufficientFunds { balance: Decimal, price: Decimal },

    #[error("Template {template_id} must be purchased before use")]
    NotPurchased { template_id: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Files(#[from] FileStoreError),
}

/// A positive money amount with at most two fractional digits.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "Amount must be greater than zero".to_string(),
        ));
    }
    validate_money(amount, "Amount")
}

/// A non-negative price with at most two fractional digits.
pub fn validate_price(price: Decimal) -> Result<Decimal, LedgerError> {
    if price < Decimal::ZERO {
        return Err(LedgerError::Validation(
            "Price must be zero or greater".to_string(),
        ));
    }
    validate_money(price, "Price")
}

fn validate_money(value: Decimal, field: &str) -> Result<Decimal, LedgerError> {
    let normalized = value.normalize();
    if normalized.scale() > MONEY_SCALE {
        return Err(LedgerError::Validation(format!(
            "{field} may have at most {MONEY_SCALE} decimal places"
        )));
    }
    if normalized > max_money() {
        return Err(LedgerError::Validation(format!("{field} is too large")));
    }
    Ok(normalized)
}

/// Balance after paying `price`, or `InsufficientFunds`.
pub fn debit(balance: Decimal, price: Decimal) -> Result<Decimal, LedgerError> {
    if balance < price {
        return Err(LedgerError::InsufficientFunds { balance, price });
    }
    Ok(balance - price)
}
