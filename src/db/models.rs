//! Row structs for the read side of the repositories. Status and type
//! columns are stored as text; the typed enums live in the `social` and
//! `market` domain modules.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub funding_goal: i64,
    pub current_funding: i64,
    pub votes: i64,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dag {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub dag_type: Option<String>,
    pub is_active: bool,
    pub member_count: i64,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author_id: String,
    pub listing_type: String,
    pub status: String,
    pub price: Option<f64>,
    pub currency: String,
    pub views: i64,
    pub visibility: String,
    pub creator_type: String,
    pub target_amount: Option<f64>,
    pub current_amount: f64,
    pub end_date: Option<String>,
    pub dag_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub owner_id: String,
    pub channel_type: String,
    pub visibility: String,
    pub dag_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub channel_id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub post_type: String,
    pub status: String,
    pub media_url: Option<String>,
    pub external_url: Option<String>,
    pub poll_ends_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub post_id: String,
    pub parent_id: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}
