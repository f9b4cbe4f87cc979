use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::forms::read_form;
use crate::models::user::User;
use crate::state::AppState;
use crate::users::{register, update_profile, ProfileForm};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub phone_number: String,
}

/// POST /api/v1/users
/// Returns the existing account when the phone number is already registered.
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<User>, AppError> {
    Ok(Json(register(state.users.as_ref(), &req.phone_number).await?))
}

/// GET /api/v1/users/me
pub async fn handle_get_profile(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// PATCH /api/v1/users/me
/// multipart/form-data: first_name, last_name, birth_date, profile_picture (file)
pub async fn handle_update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<User>, AppError> {
    let mut form = read_form(multipart, state.config.max_upload_bytes).await?;
    let profile = ProfileForm {
        first_name: form.text("first_name").map(str::to_string),
        last_name: form.text("last_name").map(str::to_string),
        birth_date: form.text("birth_date").map(str::to_string),
        picture: form.take_file("profile_picture"),
    };
    let updated = update_profile(state.users.as_ref(), state.files.as_ref(), user.id, profile).await?;
    Ok(Json(updated))
}
