//! Actor extraction from the `x-actor-id` header.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::models::Actor;
use crate::AppState;

/// Header carrying the acting user's profile id.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The resolved acting user of a request.
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let id = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Unauthenticated(format!("Missing {} header", ACTOR_HEADER)))?;

        match state.identity.resolve_actor(id).await? {
            Some(actor) => Ok(CurrentActor(actor)),
            None => {
                tracing::debug!("Unknown actor id {}", id);
                Err(AppError::Unauthenticated(format!("Unknown actor {}", id)))
            }
        }
    }
}
