//! Encoded post grammar.
//!
//! A post is stored as one string of `" - "`-separated fields. Current posts
//! carry `name - content - timestamp - authorId`; older posts carry
//! `name - content` with an optional trailing timestamp. Content may itself
//! contain the separator, so it is always rebuilt by re-joining the middle
//! fields.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

pub const SEPARATOR: &str = " - ";

/// Author name reported for strings that carry no separator at all.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A decoded post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedPost {
    Current {
        author_name: String,
        content: String,
        timestamp: String,
        author_id: String,
    },
    Legacy {
        author_name: String,
        content: String,
        timestamp: Option<String>,
    },
    /// No separator found; the whole string is content.
    Unparsed { content: String },
}

impl DecodedPost {
    pub fn author_name(&self) -> &str {
        match self {
            DecodedPost::Current { author_name, .. } | DecodedPost::Legacy { author_name, .. } => {
                author_name
            }
            DecodedPost::Unparsed { .. } => UNKNOWN_AUTHOR,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            DecodedPost::Current { content, .. }
            | DecodedPost::Legacy { content, .. }
            | DecodedPost::Unparsed { content } => content,
        }
    }

    pub fn timestamp(&self) -> Option<&str> {
        match self {
            DecodedPost::Current { timestamp, .. } => Some(timestamp),
            DecodedPost::Legacy { timestamp, .. } => timestamp.as_deref(),
            DecodedPost::Unparsed { .. } => None,
        }
    }

    pub fn author_id(&self) -> Option<&str> {
        match self {
            DecodedPost::Current { author_id, .. } => Some(author_id),
            _ => None,
        }
    }
}

/// Current UTC time in the format posts and comments are stamped with.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build a current-format post.
pub fn encode_post(author_name: &str, content: &str, timestamp: &str, author_id: &str) -> String {
    [author_name, content, timestamp, author_id].join(SEPARATOR)
}

/// Whether `content` comes back unchanged from [`decode_post`] once encoded.
///
/// A trailing `" -"` fuses with the following separator into `" - - "`, and
/// the split then leaves a stray `"- "` on the timestamp field.
pub fn is_encodable_content(content: &str) -> bool {
    !content.ends_with(DANGLING_DASH)
}

/// Whether `name` can lead an encoded post without shifting its fields.
pub fn is_encodable_name(name: &str) -> bool {
    !name.contains(SEPARATOR) && !name.ends_with(DANGLING_DASH)
}

const DANGLING_DASH: &str = " -";

/// Parse a stored post. Never fails; unrecognised shapes degrade to
/// [`DecodedPost::Legacy`] or [`DecodedPost::Unparsed`].
pub fn decode_post(encoded: &str) -> DecodedPost {
    let parts: Vec<&str> = encoded.split(SEPARATOR).collect();
    let n = parts.len();

    if n < 2 {
        return DecodedPost::Unparsed {
            content: encoded.to_string(),
        };
    }

    let author_name = parts[0].to_string();

    if n >= 4 && is_timestamp(parts[n - 2]) {
        return DecodedPost::Current {
            author_name,
            content: parts[1..n - 2].join(SEPARATOR),
            timestamp: parts[n - 2].to_string(),
            author_id: parts[n - 1].to_string(),
        };
    }

    if n == 3 && is_timestamp(parts[2]) {
        return DecodedPost::Legacy {
            author_name,
            content: parts[1].to_string(),
            timestamp: Some(parts[2].to_string()),
        };
    }

    DecodedPost::Legacy {
        author_name,
        content: parts[1..].join(SEPARATOR),
        timestamp: None,
    }
}

/// A field is a timestamp only if it parses as a date and contains `T`.
/// The `T` guard keeps free text such as `"2024"` from being taken as a date.
pub fn is_timestamp(field: &str) -> bool {
    if !field.contains('T') {
        return false;
    }
    DateTime::parse_from_rfc3339(field).is_ok()
        || ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(field, fmt).is_ok())
}
