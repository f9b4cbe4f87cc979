use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub direction: String,
    pub language: String,
    pub price: Decimal,
    pub is_free: bool,
    pub is_enabled: bool,
    pub template_path: String,
    pub preview_path: Option<String>,
    pub category: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// Amount debited when this template is purchased. Free templates never debit.
    pub fn effective_price(&self) -> Decimal {
        if self.is_free {
            Decimal::ZERO
        } else {
            self.price
        }
    }
}

/// Validated input for a new catalog row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
    pub direction: String,
    pub language: String,
    pub price: Decimal,
    pub is_free: bool,
    pub is_enabled: bool,
    pub template_path: String,
    pub preview_path: Option<String>,
    pub category: Option<String>,
    pub sort_order: i32,
}

/// Partial catalog update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub direction: Option<String>,
    pub language: Option<String>,
    pub price: Option<Decimal>,
    pub is_free: Option<bool>,
    pub is_enabled: Option<bool>,
    pub template_path: Option<String>,
    pub preview_path: Option<String>,
    pub category: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateFilter {
    pub enabled_only: bool,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Entitlement {
    pub id: i64,
    pub user_id: i64,
    pub template_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A catalog row as seen by one user.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateView {
    #[serde(flatten)]
    pub template: Template,
    pub purchased: bool,
}
