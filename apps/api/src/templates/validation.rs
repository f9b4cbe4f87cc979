use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::AppError;
use crate::ledger::validate_price;
use crate::models::template::{NewTemplate, TemplatePatch};

const NAME_MAX: usize = 100;
const LANGUAGE_MAX: usize = 50;
const PATH_MAX: usize = 255;
const CATEGORY_MAX: usize = 50;

fn default_direction() -> String {
    "ltr".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

fn default_true() -> bool {
    true
}

/// Body of `POST /api/v1/admin/templates`.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_direction")]
    pub direction: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default = "default_true")]
    pub is_free: bool,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    pub template_path: String,
    pub preview_path: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// Body of `PUT /api/v1/admin/templates/:id`. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateUpdateInput {
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

fn bounded(field: &str, value: &str, min: usize, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(if min > 0 {
            format!("{field} must be {min} to {max} characters")
        } else {
            format!("{field} must be at most {max} characters")
        }));
    }
    Ok(value.to_string())
}

fn direction(value: &str) -> Result<String, AppError> {
    match value {
        "ltr" | "rtl" => Ok(value.to_string()),
        _ => Err(AppError::Validation(
            "direction must be 'ltr' or 'rtl'".to_string(),
        )),
    }
}

pub fn sort_order(value: i32) -> Result<i32, AppError> {
    if value < 0 {
        return Err(AppError::Validation("sort_order must be >= 0".to_string()));
    }
    Ok(value)
}

impl TemplateInput {
    pub fn validate(self) -> Result<NewTemplate, AppError> {
        Ok(NewTemplate {
            name: bounded("name", &self.name, 1, NAME_MAX)?,
            description: self.description,
            direction: direction(&self.direction)?,
            language: bounded("language", &self.language, 0, LANGUAGE_MAX)?,
            price: validate_price(self.price)?,
            is_free: self.is_free,
            is_enabled: self.is_enabled,
            template_path: bounded("template_path", &self.template_path, 1, PATH_MAX)?,
            preview_path: self
                .preview_path
                .map(|p| bounded("preview_path", &p, 0, PATH_MAX))
                .transpose()?,
            category: self
                .category
                .map(|c| bounded("category", &c, 0, CATEGORY_MAX))
                .transpose()?,
            sort_order: sort_order(self.sort_order)?,
        })
    }
}

impl TemplateUpdateInput {
    pub fn validate(self) -> Result<TemplatePatch, AppError> {
        Ok(TemplatePatch {
            name: self
                .name
                .map(|n| bounded("name", &n, 1, NAME_MAX))
                .transpose()?,
            description: self.description,
            direction: self.direction.as_deref().map(direction).transpose()?,
            language: self
                .language
                .map(|l| bounded("language", &l, 0, LANGUAGE_MAX))
                .transpose()?,
            price: self.price.map(validate_price).transpose()?,
            is_free: self.is_free,
            is_enabled: self.is_enabled,
            template_path: self
                .template_path
                .map(|p| bounded("template_path", &p, 1, PATH_MAX))
                .transpose()?,
            preview_path: self
                .preview_path
                .map(|p| bounded("preview_path", &p, 0, PATH_MAX))
                .transpose()?,
            category: self
                .category
                .map(|c| bounded("category", &c, 0, CATEGORY_MAX))
                .transpose()?,
            sort_order: self.sort_order.map(sort_order).transpose()?,
        })
    }
}
