//! Post and comment API endpoints.
//!
//! Each handler reads the group fresh, applies one board operation and
//! answers with the board as it stands after the write.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{success, ApiResult};
use crate::auth::CurrentActor;
use crate::errors::AppError;
use crate::models::{Actor, Comment, ContentRequest};
use crate::thread::{GroupThreadStore, PostView};
use crate::AppState;

/// The board after a mutation, plus whatever the mutation created.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardUpdate<T: Serialize> {
    pub group_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<T>,
    /// Newest first
    pub posts: Vec<PostView>,
}

impl<T: Serialize> BoardUpdate<T> {
    fn new(threads: &GroupThreadStore, created: Option<T>) -> Self {
        Self {
            group_id: threads.group_id().to_string(),
            created,
            posts: threads.views(),
        }
    }
}

/// A freshly created post.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPost {
    pub position: usize,
    pub encoded: String,
}

async fn load_for_member(
    state: &AppState,
    group_id: &str,
    actor: &Actor,
) -> Result<GroupThreadStore, AppError> {
    let threads = GroupThreadStore::load(state.groups.clone(), group_id).await?;
    if !threads.is_member(&actor.id) {
        return Err(AppError::Unauthorized(
            "Only members can post in this group".to_string(),
        ));
    }
    Ok(threads)
}

/// POST /api/groups/:id/posts - Create a post.
pub async fn create_post(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(request): Json<ContentRequest>,
) -> ApiResult<BoardUpdate<CreatedPost>> {
    let mut threads = load_for_member(&state, &id, &actor).await?;
    let encoded = threads.create_post(&actor, &request.content).await?;

    let created = CreatedPost {
        position: threads.board().len() - 1,
        encoded,
    };
    success(BoardUpdate::new(&threads, Some(created)))
}

/// DELETE /api/groups/:id/posts/:position - Delete a post and its comments.
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((id, position)): Path<(String, usize)>,
) -> ApiResult<BoardUpdate<()>> {
    let mut threads = GroupThreadStore::load(state.groups.clone(), &id).await?;
    threads.delete_post(&actor, position).await?;
    success(BoardUpdate::new(&threads, None))
}

/// POST /api/groups/:id/posts/:position/comments - Comment on a post.
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((id, position)): Path<(String, usize)>,
    Json(request): Json<ContentRequest>,
) -> ApiResult<BoardUpdate<Comment>> {
    let mut threads = load_for_member(&state, &id, &actor).await?;
    let comment = threads
        .add_comment(&actor, position, &request.content)
        .await?;
    success(BoardUpdate::new(&threads, Some(comment)))
}

/// DELETE /api/groups/:id/posts/:position/comments/:index - Delete a comment.
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((id, position, index)): Path<(String, usize, usize)>,
) -> ApiResult<BoardUpdate<()>> {
    let mut threads = GroupThreadStore::load(state.groups.clone(), &id).await?;
    threads.delete_comment(&actor, position, index).await?;
    success(BoardUpdate::new(&threads, None))
}
