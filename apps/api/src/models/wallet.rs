use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "wallet_charge_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ChargeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeStatus::Pending => "pending",
            ChargeStatus::Accepted => "accepted",
            ChargeStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ChargeStatus::Pending)
    }
}

impl fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WalletCharge {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub receipt_ref: String,
    pub status: ChargeStatus,
    pub created_at: DateTime<Utc>,
}

/// Scope of a charge listing. `user_id = None` is the admin view.
#[derive(Debug, Clone, Default)]
pub struct ChargeFilter {
    pub user_id: Option<i64>,
    pub status: Option<ChargeStatus>,
}
