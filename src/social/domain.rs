//! Social-feed domain types. Pure, no side effects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Visibility tiers shared by channels, listings, products, and campaigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    PublicWorld,
    PublicDa,
    PrivateDag,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::PublicWorld => "public_world",
            Visibility::PublicDa => "public_da",
            Visibility::PrivateDag => "private_dag",
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public_world" => Ok(Visibility::PublicWorld),
            "public_da" => Ok(Visibility::PublicDa),
            "private_dag" => Ok(Visibility::PrivateDag),
            other => Err(format!("unknown visibility: {other}")),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Ecosystem,
    Dag,
    Personal,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Ecosystem => "ecosystem",
            ChannelType::Dag => "dag",
            ChannelType::Personal => "personal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Text,
    Image,
    Video,
    Article,
    Link,
    Poll,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Text => "text",
            PostType::Image => "image",
            PostType::Video => "video",
            PostType::Article => "article",
            PostType::Link => "link",
            PostType::Poll => "poll",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Published,
    Draft,
    Archived,
    Deleted,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Published => "published",
            PostStatus::Draft => "draft",
            PostStatus::Archived => "archived",
            PostStatus::Deleted => "deleted",
        }
    }
}

/// Hide/delete is a status change, never a cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    Published,
    Deleted,
    Hidden,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Published => "published",
            CommentStatus::Deleted => "deleted",
            CommentStatus::Hidden => "hidden",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Love => "love",
            ReactionKind::Haha => "haha",
            ReactionKind::Wow => "wow",
            ReactionKind::Sad => "sad",
            ReactionKind::Angry => "angry",
        }
    }
}

/// A reaction targets exactly one of a post or a comment; the type makes the
/// both/neither states unrepresentable above the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionTarget {
    Post(String),
    Comment(String),
}

impl ReactionTarget {
    pub fn post_id(&self) -> Option<&str> {
        match self {
            ReactionTarget::Post(id) => Some(id),
            ReactionTarget::Comment(_) => None,
        }
    }

    pub fn comment_id(&self) -> Option<&str> {
        match self {
            ReactionTarget::Post(_) => None,
            ReactionTarget::Comment(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewChannel {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub channel_type: ChannelType,
    pub visibility: Visibility,
    pub dag_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub channel_id: String,
    pub author_id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub post_type: PostType,
    pub media_url: Option<String>,
    pub external_url: Option<String>,
    pub poll_ends_at: Option<String>,
}

impl NewPost {
    pub fn text(channel_id: &str, author_id: &str, content: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            author_id: author_id.to_string(),
            title: None,
            content: Some(content.to_string()),
            post_type: PostType::Text,
            media_url: None,
            external_url: None,
            poll_ends_at: None,
        }
    }
}

/// Channel-name uniqueness is enforced on this transform, not the raw
/// display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_normalizes_names() {
        assert_eq!(slugify("General Discussion"), "general-discussion");
        assert_eq!(slugify("  Hello,  World!  "), "hello-world");
        assert_eq!(slugify("DAG / Research"), "dag-research");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
    }

    #[test]
    fn slugify_collides_on_case_and_punctuation() {
        // Names differing only in case or punctuation map to one slug
        assert_eq!(slugify("General Discussion"), slugify("general discussion"));
        assert_eq!(slugify("General Discussion"), slugify("General, Discussion!"));
    }

    #[test]
    fn visibility_round_trips() {
        for v in [
            Visibility::PublicWorld,
            Visibility::PublicDa,
            Visibility::PrivateDag,
        ] {
            assert_eq!(v.as_str().parse::<Visibility>().unwrap(), v);
        }
        assert!("everyone".parse::<Visibility>().is_err());
    }

    #[test]
    fn reaction_target_is_exclusive() {
        let post = ReactionTarget::Post("p1".into());
        assert_eq!(post.post_id(), Some("p1"));
        assert_eq!(post.comment_id(), None);

        let comment = ReactionTarget::Comment("c1".into());
        assert_eq!(comment.post_id(), None);
        assert_eq!(comment.comment_id(), Some("c1"));
    }
}
