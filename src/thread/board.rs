//! In-memory board snapshot.
//!
//! Posts and their comment lists live side by side, one comment list per
//! post, so a post deletion moves every later comment list down with it.
//! Every mutation returns a new snapshot and leaves `self` untouched; the
//! store swaps snapshots only once the write has gone through.
//!
//! Stored comment keys that do not address an existing post (`"7"` on a
//! three-post board, `"01"`, `"x"`) are carried along untouched, so a write
//! never loses comments it did not mean to change.

use serde::Serialize;

use super::codec::{decode_post, DecodedPost};
use crate::errors::AppError;
use crate::models::{Comment, CommentMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    posts: Vec<String>,
    /// Always the same length as `posts`.
    comments: Vec<Vec<Comment>>,
    /// Comment lists whose key is not a current position. Never holds the
    /// canonical key of a position below `posts.len()`.
    unplaced: CommentMap,
}

/// A decoded post as rendered to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    /// Chronological index used to address the post
    pub position: usize,
    pub author_name: String,
    pub content: String,
    pub timestamp: Option<String>,
    pub author_id: Option<String>,
    pub comments: Vec<Comment>,
}

impl Board {
    /// Build a board from the stored fields.
    pub fn from_record(posts: Vec<String>, comments: CommentMap) -> Self {
        let mut lists = vec![Vec::new(); posts.len()];
        let mut unplaced = CommentMap::new();
        for (key, list) in comments {
            match canonical_position(&key) {
                Some(position) if position < posts.len() => lists[position] = list,
                _ => {
                    tracing::debug!(
                        "Keeping {} comment(s) under unplaced key {:?}",
                        list.len(),
                        key
                    );
                    unplaced.insert(key, list);
                }
            }
        }
        Self {
            posts,
            comments: lists,
            unplaced,
        }
    }

    pub fn posts(&self) -> &[String] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn post(&self, position: usize) -> Result<&str, AppError> {
        self.posts
            .get(position)
            .map(String::as_str)
            .ok_or_else(|| AppError::NotFound(format!("No post at position {}", position)))
    }

    pub fn comments_at(&self, position: usize) -> Result<&[Comment], AppError> {
        self.comments
            .get(position)
            .map(Vec::as_slice)
            .ok_or_else(|| AppError::NotFound(format!("No post at position {}", position)))
    }

    pub fn comment(&self, position: usize, index: usize) -> Result<&Comment, AppError> {
        self.comments_at(position)?.get(index).ok_or_else(|| {
            AppError::NotFound(format!(
                "No comment {} on post at position {}",
                index, position
            ))
        })
    }

    /// Comments in their stored form. Posts without comments get no key;
    /// unplaced keys are written back as they were read.
    pub fn comment_map(&self) -> CommentMap {
        let mut map = self.unplaced.clone();
        map.extend(
            self.comments
                .iter()
                .enumerate()
                .filter(|(_, list)| !list.is_empty())
                .map(|(position, list)| (position.to_string(), list.clone())),
        );
        map
    }

    /// Keys with no post behind them, as stored.
    pub fn unplaced(&self) -> &CommentMap {
        &self.unplaced
    }

    /// Append a post. Comments already stored under the new post's position
    /// key belong to it from now on.
    pub fn with_post(&self, encoded: String) -> Board {
        let mut next = self.clone();
        let adopted = next
            .unplaced
            .remove(&next.posts.len().to_string())
            .unwrap_or_default();
        next.posts.push(encoded);
        next.comments.push(adopted);
        next
    }

    pub fn with_comment(&self, position: usize, comment: Comment) -> Result<Board, AppError> {
        self.post(position)?;
        let mut next = self.clone();
        next.comments[position].push(comment);
        Ok(next)
    }

    /// Remove a post and its comments; later comment lists shift down one
    /// position along with their posts.
    pub fn without_post(&self, position: usize) -> Result<Board, AppError> {
        self.post(position)?;
        let mut next = self.clone();
        next.posts.remove(position);
        next.comments.remove(position);
        // Unplaced positions all lie past the end, so each shifts down too.
        next.unplaced = std::mem::take(&mut next.unplaced)
            .into_iter()
            .map(|(key, list)| match canonical_position(&key) {
                Some(k) if k > position => ((k - 1).to_string(), list),
                _ => (key, list),
            })
            .collect();
        Ok(next)
    }

    pub fn without_comment(&self, position: usize, index: usize) -> Result<Board, AppError> {
        self.comment(position, index)?;
        let mut next = self.clone();
        next.comments[position].remove(index);
        Ok(next)
    }

    pub fn decode(&self, position: usize) -> Result<DecodedPost, AppError> {
        self.post(position).map(decode_post)
    }

    /// Decoded posts, newest first. Positions stay chronological.
    pub fn views(&self) -> Vec<PostView> {
        self.posts
            .iter()
            .zip(&self.comments)
            .enumerate()
            .rev()
            .map(|(position, (encoded, comments))| {
                let post = decode_post(encoded);
                PostView {
                    position,
                    author_name: post.author_name().to_string(),
                    content: post.content().to_string(),
                    timestamp: post.timestamp().map(str::to_string),
                    author_id: post.author_id().map(str::to_string),
                    comments: comments.clone(),
                }
            })
            .collect()
    }
}

/// The position a key addresses, if it is written the way positions are
/// keyed (`"3"`, not `"03"` or `"+3"`).
fn canonical_position(key: &str) -> Option<usize> {
    key.parse::<usize>()
        .ok()
        .filter(|position| position.to_string() == key)
}
