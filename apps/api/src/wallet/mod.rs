//! HTTP surface of the wallet: user top-ups and admin review.

pub mod admin;
pub mod handlers;

use serde::Deserialize;

use crate::models::wallet::ChargeStatus;
use crate::store::{Page, DEFAULT_PAGE_LIMIT};

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

/// `?skip=&limit=&status=` on charge listings.
#[derive(Debug, Deserialize)]
pub struct ChargeListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<ChargeStatus>,
    /// Admin listings only; ignored on the user's own listing.
    pub user_id: Option<i64>,
}

impl ChargeListQuery {
    pub fn page(&self) -> Page {
        Page {
            skip: self.skip,
            limit: self.limit,
        }
    }
}
