//! Registration and profile management.

pub mod handlers;

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::errors::AppError;
use crate::files::{object_key, FileStore, Upload};
use crate::models::user::{ProfileUpdate, User};
use crate::store::UserDirectory;

const NAME_MAX: usize = 50;
const PICTURE_PREFIX: &str = "profile_pictures";

/// Strips spaces and dashes; keeps an optional leading `+` and 10 to 14 digits.
pub fn normalize_phone(raw: &str) -> Result<String, AppError> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    if !(10..=14).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "phone_number must contain 10 to 14 digits".to_string(),
        ));
    }
    Ok(compact)
}

fn validate_name(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > NAME_MAX {
        return Err(AppError::Validation(format!(
            "{field} must be 1 to {NAME_MAX} characters"
        )));
    }
    Ok(value.to_string())
}

fn validate_birth_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, AppError> {
    let earliest = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
    if date >= today || date < earliest {
        return Err(AppError::Validation(
            "birth_date must be in the past".to_string(),
        ));
    }
    Ok(date)
}

/// Raw profile form values. Absent fields leave the stored value untouched.
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub picture: Option<Upload>,
}

pub async fn register(users: &dyn UserDirectory, phone_number: &str) -> Result<User, AppError> {
    let phone = normalize_phone(phone_number)?;
    let user = users.register(&phone).await?;
    info!("Registered user {} ({})", user.id, user.phone_number);
    Ok(user)
}

/// Validates every field before writing; the picture is uploaded only once
/// the text fields have passed.
pub async fn update_profile(
    users: &dyn UserDirectory,
    files: &dyn FileStore,
    user_id: i64,
    form: ProfileForm,
) -> Result<User, AppError> {
    let mut update = ProfileUpdate {
        first_name: form
            .first_name
            .as_deref()
            .map(|v| validate_name("first_name", v))
            .transpose()?,
        last_name: form
            .last_name
            .as_deref()
            .map(|v| validate_name("last_name", v))
            .transpose()?,
        birth_date: form
            .birth_date
            .as_deref()
            .map(|v| {
                NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                    .map_err(|_| AppError::Validation("birth_date must be YYYY-MM-DD".to_string()))
                    .and_then(|d| validate_birth_date(d, Utc::now().date_naive()))
            })
            .transpose()?,
        profile_picture: None,
    };

    if let Some(picture) = form.picture {
        if !picture.content_type.starts_with("image/") {
            return Err(AppError::Validation(
                "profile_picture must be an image".to_string(),
            ));
        }
        let key = object_key(PICTURE_PREFIX, user_id, &picture.file_name);
        update.profile_picture = Some(files.put(&key, &picture.content_type, picture.bytes).await?);
    }

    users
        .update_profile(user_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id}")))
}
