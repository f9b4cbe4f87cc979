//! Template marketplace: user-facing catalog and purchases, plus admin CRUD.

pub mod admin;
pub mod handlers;
pub mod validation;

use serde::Deserialize;

use crate::store::{Page, DEFAULT_PAGE_LIMIT};

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

/// `?skip=&limit=&category=&enabled_only=` on catalog listings.
#[derive(Debug, Deserialize)]
pub struct TemplateListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub category: Option<String>,
    /// Admin listings only; users always see enabled rows.
    #[serde(default)]
    pub enabled_only: bool,
}

impl TemplateListQuery {
    pub fn page(&self) -> Page {
        Page {
            skip: self.skip,
            limit: self.limit,
        }
    }
}
