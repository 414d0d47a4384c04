//! Profile model backing the identity collaborator.

use serde::{Deserialize, Serialize};

/// A user profile. Only `id` and `display_name` reach the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub lifestyle: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a new profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub display_name: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub lifestyle: Vec<String>,
}

/// The acting user of a board operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl From<&Profile> for Actor {
    fn from(profile: &Profile) -> Self {
        Actor::new(profile.id.clone(), profile.display_name.clone())
    }
}
