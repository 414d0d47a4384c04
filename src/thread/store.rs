//! Group thread store.
//!
//! Holds the last-known board of one group and applies the four board
//! operations as read-modify-write against the [`GroupStore`]. Each operation
//! computes the next snapshot, writes it, and only then replaces the local
//! snapshot, so a failed write leaves local state exactly as it was.

use std::sync::Arc;

use super::board::{Board, PostView};
use super::codec::{encode_post, is_encodable_content, is_encodable_name, now_timestamp};
use super::GroupStore;
use crate::errors::AppError;
use crate::models::{Actor, Comment, GroupRecord, ThreadUpdate};

pub struct GroupThreadStore {
    store: Arc<dyn GroupStore>,
    group_id: String,
    admin: String,
    members: Vec<String>,
    board: Board,
}

impl GroupThreadStore {
    /// Read the group once and keep its board as the local snapshot.
    pub async fn load(store: Arc<dyn GroupStore>, group_id: &str) -> Result<Self, AppError> {
        let group = store
            .get_group(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))?;
        Ok(Self::from_record(store, group))
    }

    pub fn from_record(store: Arc<dyn GroupStore>, group: GroupRecord) -> Self {
        Self {
            store,
            group_id: group.id,
            admin: group.admin,
            members: group.members,
            board: Board::from_record(group.posts, group.comments),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn views(&self) -> Vec<PostView> {
        self.board.views()
    }

    pub fn is_member(&self, actor_id: &str) -> bool {
        self.admin == actor_id || self.members.iter().any(|m| m == actor_id)
    }

    /// Append a post authored by `actor` and return its encoded form.
    pub async fn create_post(&mut self, actor: &Actor, content: &str) -> Result<String, AppError> {
        let content = non_blank(content, "Post content")?;
        if !is_encodable_content(content) {
            return Err(AppError::Validation(
                "Post content must not end with \" -\"".to_string(),
            ));
        }
        if !is_encodable_name(&actor.name) {
            return Err(AppError::Validation(format!(
                "Display name {:?} cannot author posts",
                actor.name
            )));
        }
        let encoded = encode_post(&actor.name, content, &now_timestamp(), &actor.id);
        let next = self.board.with_post(encoded.clone());

        self.write(
            ThreadUpdate {
                posts: Some(next.posts().to_vec()),
                comments: None,
            },
            next,
        )
        .await?;

        tracing::info!(
            "Post created in group {} by {} at position {}",
            self.group_id,
            actor.id,
            self.board.len() - 1
        );
        Ok(encoded)
    }

    pub async fn add_comment(
        &mut self,
        actor: &Actor,
        position: usize,
        content: &str,
    ) -> Result<Comment, AppError> {
        let content = non_blank(content, "Comment content")?;
        let comment = Comment {
            user: actor.name.clone(),
            user_id: Some(actor.id.clone()),
            content: content.to_string(),
            timestamp: now_timestamp(),
        };
        let next = self.board.with_comment(position, comment.clone())?;

        self.write(
            ThreadUpdate {
                posts: None,
                comments: Some(next.comment_map()),
            },
            next,
        )
        .await?;

        tracing::info!(
            "Comment added in group {} on position {} by {}",
            self.group_id,
            position,
            actor.id
        );
        Ok(comment)
    }

    /// Remove a post together with its comments. Allowed for the post's
    /// author and the group admin.
    pub async fn delete_post(&mut self, actor: &Actor, position: usize) -> Result<(), AppError> {
        let post = self.board.decode(position)?;
        if post.author_id() != Some(actor.id.as_str()) && actor.id != self.admin {
            tracing::warn!(
                "Actor {} may not delete post {} in group {}",
                actor.id,
                position,
                self.group_id
            );
            return Err(AppError::Unauthorized(
                "Only the author or the group admin can delete this post".to_string(),
            ));
        }

        let next = self.board.without_post(position)?;
        self.write(
            ThreadUpdate {
                posts: Some(next.posts().to_vec()),
                comments: Some(next.comment_map()),
            },
            next,
        )
        .await?;

        tracing::info!(
            "Post {} deleted from group {} by {}",
            position,
            self.group_id,
            actor.id
        );
        Ok(())
    }

    pub async fn delete_comment(
        &mut self,
        actor: &Actor,
        position: usize,
        comment_index: usize,
    ) -> Result<(), AppError> {
        let comment = self.board.comment(position, comment_index)?;
        if comment.user_id.as_deref() != Some(actor.id.as_str()) && actor.id != self.admin {
            tracing::warn!(
                "Actor {} may not delete comment {}/{} in group {}",
                actor.id,
                position,
                comment_index,
                self.group_id
            );
            return Err(AppError::Unauthorized(
                "Only the author or the group admin can delete this comment".to_string(),
            ));
        }

        let next = self.board.without_comment(position, comment_index)?;
        self.write(
            ThreadUpdate {
                posts: None,
                comments: Some(next.comment_map()),
            },
            next,
        )
        .await?;

        tracing::info!(
            "Comment {}/{} deleted from group {} by {}",
            position,
            comment_index,
            self.group_id,
            actor.id
        );
        Ok(())
    }

    async fn write(&mut self, update: ThreadUpdate, next: Board) -> Result<(), AppError> {
        if let Err(e) = self.store.update_threads(&self.group_id, update).await {
            tracing::error!("Board write for group {} failed: {}", self.group_id, e);
            return Err(match e {
                AppError::Persistence(_) => e,
                other => AppError::Persistence(other.message().to_string()),
            });
        }
        self.board = next;
        Ok(())
    }
}

fn non_blank<'a>(content: &'a str, what: &str) -> Result<&'a str, AppError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", what)));
    }
    Ok(trimmed)
}
