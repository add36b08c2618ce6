//! Marketplace and economy domain types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use crate::social::domain::Visibility;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Backlog,
    Wip,
    Blocked,
    Done,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Backlog => "backlog",
            ProjectStatus::Wip => "wip",
            ProjectStatus::Blocked => "blocked",
            ProjectStatus::Done => "done",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(ProjectStatus::Backlog),
            "wip" => Ok(ProjectStatus::Wip),
            "blocked" => Ok(ProjectStatus::Blocked),
            "done" => Ok(ProjectStatus::Done),
            other => Err(format!("unknown project status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    Member,
    Admin,
    Moderator,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Member => "member",
            MembershipRole::Admin => "admin",
            MembershipRole::Moderator => "moderator",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    Inactive,
    Suspended,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Inactive => "inactive",
            MembershipStatus::Suspended => "suspended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Physical,
    Digital,
    Investment,
    Charity,
    Crowdfunding,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Physical => "physical",
            ListingType::Digital => "digital",
            ListingType::Investment => "investment",
            ListingType::Charity => "charity",
            ListingType::Crowdfunding => "crowdfunding",
        }
    }

    /// Fundraising listing types carry a target amount.
    pub fn is_fundraising(&self) -> bool {
        matches!(
            self,
            ListingType::Investment | ListingType::Charity | ListingType::Crowdfunding
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopStatus {
    Pending,
    Approved,
    Suspended,
}

impl ShopStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShopStatus::Pending => "pending",
            ShopStatus::Approved => "approved",
            ShopStatus::Suspended => "suspended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    Charity,
    Investment,
    Crowdfunding,
}

impl CampaignType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignType::Charity => "charity",
            CampaignType::Investment => "investment",
            CampaignType::Crowdfunding => "crowdfunding",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub author_id: String,
    pub listing_type: ListingType,
    pub price: Option<f64>,
    pub visibility: Visibility,
    pub target_amount: Option<f64>,
    pub end_date: Option<String>,
    pub dag_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub title: String,
    pub description: String,
    pub goal: i64,
    pub creator_id: String,
    pub end_date: String,
    pub campaign_type: CampaignType,
    pub visibility: Visibility,
    pub dag_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_status_round_trips() {
        for s in [
            ProjectStatus::Backlog,
            ProjectStatus::Wip,
            ProjectStatus::Blocked,
            ProjectStatus::Done,
        ] {
            assert_eq!(s.as_str().parse::<ProjectStatus>().unwrap(), s);
        }
        assert!("paused".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn fundraising_listing_types() {
        assert!(ListingType::Crowdfunding.is_fundraising());
        assert!(ListingType::Charity.is_fundraising());
        assert!(!ListingType::Physical.is_fundraising());
        assert!(!ListingType::Digital.is_fundraising());
    }
}
