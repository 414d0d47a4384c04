//! Group record model and the board payloads derived from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Comments keyed by the stringified position of the post they belong to.
pub type CommentMap = BTreeMap<String, Vec<Comment>>;

/// A comment on a group post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Display name at the time of posting
    pub user: String,
    /// Absent on comments written before ids were recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub content: String,
    pub timestamp: String,
}

/// A group as stored. `posts` and `comments` are only ever overwritten whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub admin: String,
    pub members: Vec<String>,
    pub posts: Vec<String>,
    pub comments: CommentMap,
    pub created_at: String,
    pub updated_at: String,
}

impl GroupRecord {
    pub fn is_member(&self, actor_id: &str) -> bool {
        self.admin == actor_id || self.members.iter().any(|m| m == actor_id)
    }
}

/// Group listing entry without the board contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub admin: String,
    pub member_count: usize,
    pub post_count: usize,
}

impl From<&GroupRecord> for GroupSummary {
    fn from(group: &GroupRecord) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            description: group.description.clone(),
            admin: group.admin.clone(),
            member_count: group.members.len(),
            post_count: group.posts.len(),
        }
    }
}

/// Request body for creating a new group.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for creating a post or a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

/// Partial overwrite of the board fields of a group record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadUpdate {
    pub posts: Option<Vec<String>>,
    pub comments: Option<CommentMap>,
}
