//! Profile API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{required, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateProfileRequest, Profile};
use crate::thread::{is_encodable_name, SEPARATOR};
use crate::AppState;

/// GET /api/profiles - List all profiles.
pub async fn list_profiles(State(state): State<AppState>) -> ApiResult<Vec<Profile>> {
    success(state.repo.list_profiles().await?)
}

/// GET /api/profiles/:id - Get a single profile.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Profile> {
    match state.repo.get_profile(&id).await? {
        Some(profile) => success(profile),
        None => Err(AppError::NotFound(format!("Profile {} not found", id))),
    }
}

/// POST /api/profiles - Create a new profile.
pub async fn create_profile(
    State(state): State<AppState>,
    Json(request): Json<CreateProfileRequest>,
) -> ApiResult<Profile> {
    let display_name = required(&request.display_name, "Display name")?;
    // Encoded posts split on the separator, so a name containing it, or one
    // ending in a dash that fuses with it, would bleed into the post content.
    if !is_encodable_name(display_name) {
        return Err(AppError::Validation(format!(
            "Display name must not contain {:?} or end with \" -\"",
            SEPARATOR
        )));
    }

    let profile = state.repo.create_profile(&request).await?;
    tracing::info!("Profile {} created", profile.id);
    success(profile)
}
