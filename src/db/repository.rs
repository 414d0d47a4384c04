//! Database repository for profile and group records.
//!
//! Group boards are written field-wise: `posts` and `comments` are replaced
//! wholesale, never patched.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Actor, CommentMap, CreateGroupRequest, CreateProfileRequest, GroupRecord, Profile,
    ThreadUpdate,
};
use crate::thread::{GroupStore, IdentityProvider};

const GROUP_COLUMNS: &str =
    "id, name, description, admin, members, posts, comments, created_at, updated_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== PROFILE OPERATIONS ====================

    /// List all profiles.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        let rows = sqlx::query(
            "SELECT id, display_name, interests, core_values, lifestyle, created_at, updated_at FROM profiles ORDER BY display_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(profile_from_row).collect())
    }

    /// Get a profile by ID.
    pub async fn get_profile(&self, id: &str) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query(
            "SELECT id, display_name, interests, core_values, lifestyle, created_at, updated_at FROM profiles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(profile_from_row))
    }

    /// Create a new profile.
    pub async fn create_profile(&self, request: &CreateProfileRequest) -> Result<Profile, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let display_name = request.display_name.trim().to_string();

        sqlx::query(
            "INSERT INTO profiles (id, display_name, interests, core_values, lifestyle, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&display_name)
        .bind(serde_json::to_string(&request.interests)?)
        .bind(serde_json::to_string(&request.values)?)
        .bind(serde_json::to_string(&request.lifestyle)?)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Created profile {}", id);

        Ok(Profile {
            id,
            display_name,
            interests: request.interests.clone(),
            values: request.values.clone(),
            lifestyle: request.lifestyle.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    // ==================== GROUP OPERATIONS ====================

    /// List the groups an actor administers or belongs to.
    pub async fn list_groups_for(&self, actor_id: &str) -> Result<Vec<GroupRecord>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM group_records \
             WHERE admin = ? OR EXISTS (SELECT 1 FROM json_each(group_records.members) WHERE json_each.value = ?) \
             ORDER BY created_at",
            GROUP_COLUMNS
        ))
        .bind(actor_id)
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(group_from_row).collect()
    }

    /// Get a group by ID.
    pub async fn find_group(&self, id: &str) -> Result<Option<GroupRecord>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM group_records WHERE id = ?",
            GROUP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(group_from_row).transpose()
    }

    /// Create a group administered by `admin`, with an empty board.
    pub async fn create_group(
        &self,
        admin: &Actor,
        request: &CreateGroupRequest,
    ) -> Result<GroupRecord, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let members = vec![admin.id.clone()];
        let description = request
            .description
            .as_ref()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        sqlx::query(
            "INSERT INTO group_records (id, name, description, admin, members, posts, comments, created_at, updated_at) VALUES (?, ?, ?, ?, ?, '[]', '{}', ?, ?)",
        )
        .bind(&id)
        .bind(request.name.trim())
        .bind(&description)
        .bind(&admin.id)
        .bind(serde_json::to_string(&members)?)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(GroupRecord {
            id,
            name: request.name.trim().to_string(),
            description,
            admin: admin.id.clone(),
            members,
            posts: Vec::new(),
            comments: CommentMap::new(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Add an actor to a group's members. Joining twice is a no-op.
    pub async fn join_group(&self, id: &str, actor_id: &str) -> Result<GroupRecord, AppError> {
        let mut group = self
            .find_group(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", id)))?;

        if group.members.iter().any(|m| m == actor_id) {
            return Ok(group);
        }

        group.members.push(actor_id.to_string());
        group.updated_at = Utc::now().to_rfc3339();

        sqlx::query("UPDATE group_records SET members = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(&group.members)?)
            .bind(&group.updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(group)
    }
}

#[async_trait]
impl GroupStore for Repository {
    async fn get_group(&self, id: &str) -> Result<Option<GroupRecord>, AppError> {
        self.find_group(id).await
    }

    async fn update_threads(&self, id: &str, update: ThreadUpdate) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let posts = update.posts.as_ref().map(serde_json::to_string).transpose()?;
        let comments = update
            .comments
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = match (posts, comments) {
            (Some(posts), Some(comments)) => {
                sqlx::query(
                    "UPDATE group_records SET posts = ?, comments = ?, updated_at = ? WHERE id = ?",
                )
                .bind(posts)
                .bind(comments)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            (Some(posts), None) => {
                sqlx::query("UPDATE group_records SET posts = ?, updated_at = ? WHERE id = ?")
                    .bind(posts)
                    .bind(&now)
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
            (None, Some(comments)) => {
                sqlx::query("UPDATE group_records SET comments = ?, updated_at = ? WHERE id = ?")
                    .bind(comments)
                    .bind(&now)
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
            (None, None) => return Ok(()),
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Group {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for Repository {
    async fn resolve_actor(&self, id: &str) -> Result<Option<Actor>, AppError> {
        Ok(self.get_profile(id).await?.as_ref().map(Actor::from))
    }
}

// Helper functions for row conversion

fn profile_from_row(row: &sqlx::sqlite::SqliteRow) -> Profile {
    Profile {
        id: row.get("id"),
        display_name: row.get("display_name"),
        interests: parse_json_array(row.get("interests")),
        values: parse_json_array(row.get("core_values")),
        lifestyle: parse_json_array(row.get("lifestyle")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Board columns are rewritten whole, so a column that does not parse is
/// surfaced as a persistence failure instead of being read as empty.
fn group_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<GroupRecord, AppError> {
    let id: String = row.get("id");

    Ok(GroupRecord {
        name: row.get("name"),
        description: row.get("description"),
        admin: row.get("admin"),
        members: parse_group_column(&id, "members", row.get("members"))?,
        posts: parse_group_column(&id, "posts", row.get("posts"))?,
        comments: parse_group_column(&id, "comments", row.get("comments"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        id,
    })
}

fn parse_group_column<T: DeserializeOwned>(id: &str, column: &str, raw: &str) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|e| {
        tracing::error!("Unreadable {} on group {}: {}", column, id, e);
        AppError::Persistence(format!("Stored {} of group {} are unreadable", column, id))
    })
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
