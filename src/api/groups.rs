//! Group API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{required, success, ApiResult};
use crate::auth::CurrentActor;
use crate::errors::AppError;
use crate::models::{CreateGroupRequest, GroupRecord, GroupSummary};
use crate::thread::{GroupThreadStore, PostView};
use crate::AppState;

/// A group with its board decoded for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    #[serde(flatten)]
    pub summary: GroupSummary,
    pub members: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Newest first
    pub posts: Vec<PostView>,
}

impl GroupView {
    fn new(state: &AppState, group: GroupRecord) -> Self {
        let summary = GroupSummary::from(&group);
        let members = group.members.clone();
        let created_at = group.created_at.clone();
        let updated_at = group.updated_at.clone();
        let threads = GroupThreadStore::from_record(state.groups.clone(), group);

        Self {
            summary,
            members,
            created_at,
            updated_at,
            posts: threads.views(),
        }
    }
}

/// GET /api/groups - List the caller's groups.
pub async fn list_groups(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Vec<GroupSummary>> {
    let groups = state.repo.list_groups_for(&actor.id).await?;
    success(groups.iter().map(GroupSummary::from).collect())
}

/// GET /api/groups/:id - Get a group and its board. Members only.
pub async fn get_group(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<GroupView> {
    let group = state
        .groups
        .get_group(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", id)))?;

    if !group.is_member(&actor.id) {
        return Err(AppError::Unauthorized(
            "Only members can view this group".to_string(),
        ));
    }

    success(GroupView::new(&state, group))
}

/// POST /api/groups - Create a group administered by the caller.
pub async fn create_group(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateGroupRequest>,
) -> ApiResult<GroupView> {
    required(&request.name, "Group name")?;

    let group = state.repo.create_group(&actor, &request).await?;
    tracing::info!("Group {} created by {}", group.id, actor.id);
    success(GroupView::new(&state, group))
}

/// POST /api/groups/:id/join - Become a member of a group.
pub async fn join_group(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> ApiResult<GroupView> {
    let group = state.repo.join_group(&id, &actor.id).await?;
    tracing::info!("Actor {} joined group {}", actor.id, id);
    success(GroupView::new(&state, group))
}
