//! Persistence operations for DAGs, projects, the marketplace, and the
//! points economy.

use rusqlite::{params, OptionalExtension};

use crate::db::models::{Dag, Listing, Project};
use crate::market::domain::*;
use crate::repository::{constraint_to_conflict, RepositoryError};
use crate::state::DbPool;

pub struct MarketRepository {
    pool: DbPool,
}

impl MarketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // -- DAGs --

    pub fn create_dag(
        &self,
        name: &str,
        description: &str,
        dag_type: &str,
    ) -> Result<String, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO dags (id, name, description, dag_type) VALUES (?1, ?2, ?3, ?4)",
            params![id, name, description, dag_type],
        )
        .map_err(|e| constraint_to_conflict(e.into(), "A DAG with this name already exists"))?;
        Ok(id)
    }

    /// Join a DAG; membership is unique per (dag, user). The member count is
    /// maintained in the same transaction.
    pub fn join_dag(
        &self,
        dag_id: &str,
        user_id: &str,
        role: MembershipRole,
    ) -> Result<String, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let id = uuid::Uuid::now_v7().to_string();
        tx.execute(
            "INSERT INTO dag_memberships (id, dag_id, user_id, role) VALUES (?1, ?2, ?3, ?4)",
            params![id, dag_id, user_id, role.as_str()],
        )
        .map_err(|e| constraint_to_conflict(e.into(), "Already a member of this DAG"))?;
        tx.execute(
            "UPDATE dags SET member_count = member_count + 1 WHERE id = ?1",
            params![dag_id],
        )?;

        tx.commit()?;
        Ok(id)
    }

    pub fn set_membership_status(
        &self,
        membership_id: &str,
        status: MembershipStatus,
    ) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE dag_memberships SET status = ?2 WHERE id = ?1",
            params![membership_id, status.as_str()],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound("membership".into()));
        }
        Ok(())
    }

    // -- Projects --

    pub fn create_project(
        &self,
        owner_id: &str,
        title: &str,
        description: &str,
        funding_goal: i64,
    ) -> Result<String, RepositoryError> {
        if funding_goal <= 0 {
            return Err(RepositoryError::Invalid(
                "Funding goal must be positive".into(),
            ));
        }
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO projects (id, title, description, status, funding_goal, owner_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                title,
                description,
                ProjectStatus::Backlog.as_str(),
                funding_goal,
                owner_id
            ],
        )?;
        Ok(id)
    }

    pub fn set_project_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
    ) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE projects SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![project_id, status.as_str()],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound("project".into()));
        }
        Ok(())
    }

    /// Support a project with DAPs. One support per (project, user); the
    /// supporter's balance, the project funding, and the transaction record
    /// move together or not at all.
    pub fn support_project(
        &self,
        project_id: &str,
        user_id: &str,
        amount: i64,
    ) -> Result<String, RepositoryError> {
        if amount <= 0 {
            return Err(RepositoryError::Invalid("Amount must be positive".into()));
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let points: Option<i64> = tx
            .query_row(
                "SELECT points FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        let points = points.ok_or_else(|| RepositoryError::NotFound("user".into()))?;
        if points < amount {
            return Err(RepositoryError::Invalid("Insufficient points".into()));
        }

        let id = uuid::Uuid::now_v7().to_string();
        tx.execute(
            "INSERT INTO project_supports (id, project_id, user_id, amount) \
             VALUES (?1, ?2, ?3, ?4)",
            params![id, project_id, user_id, amount],
        )
        .map_err(|e| constraint_to_conflict(e.into(), "Already supporting this project"))?;

        let changed = tx.execute(
            "UPDATE projects SET current_funding = current_funding + ?2, \
             updated_at = datetime('now') WHERE id = ?1",
            params![project_id, amount],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound("project".into()));
        }
        tx.execute(
            "UPDATE users SET points = points - ?2 WHERE id = ?1",
            params![user_id, amount],
        )?;

        let tx_id = uuid::Uuid::now_v7().to_string();
        tx.execute(
            "INSERT INTO transactions (id, user_id, tx_type, amount, currency, status, description) \
             VALUES (?1, ?2, 'funding', ?3, 'DAP', 'completed', ?4)",
            params![tx_id, user_id, amount as f64, format!("Support for project {project_id}")],
        )?;

        tx.commit()?;
        Ok(id)
    }

    /// Credit (or debit) a user's point balance, recording the allocation.
    pub fn allocate_points(
        &self,
        username: &str,
        amount: i64,
        reason: &str,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let user_id: Option<String> = tx
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        let user_id = user_id.ok_or_else(|| RepositoryError::NotFound("user".into()))?;

        tx.execute(
            "UPDATE users SET points = points + ?2 WHERE id = ?1",
            params![user_id, amount],
        )?;
        let tx_id = uuid::Uuid::now_v7().to_string();
        tx.execute(
            "INSERT INTO transactions (id, user_id, tx_type, amount, currency, status, description) \
             VALUES (?1, ?2, 'allocation', ?3, 'DAP', 'completed', ?4)",
            params![tx_id, user_id, amount as f64, reason],
        )?;

        tx.commit()?;
        Ok(())
    }

    pub fn user_points(&self, user_id: &str) -> Result<i64, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(conn.query_row(
            "SELECT points FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )?)
    }

    // -- Listings --

    pub fn create_listing(&self, listing: &NewListing) -> Result<String, RepositoryError> {
        if listing.visibility == Visibility::PrivateDag && listing.dag_id.is_none() {
            return Err(RepositoryError::Invalid(
                "A DAG is required for DAG-private listings".into(),
            ));
        }
        if listing.listing_type.is_fundraising() && listing.target_amount.is_none() {
            return Err(RepositoryError::Invalid(
                "A target amount is required for fundraising listings".into(),
            ));
        }

        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO listings (id, title, description, author_id, listing_type, price, \
                                   visibility, target_amount, end_date, dag_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                listing.title,
                listing.description,
                listing.author_id,
                listing.listing_type.as_str(),
                listing.price,
                listing.visibility.as_str(),
                listing.target_amount,
                listing.end_date,
                listing.dag_id,
            ],
        )?;
        Ok(id)
    }

    // -- Shops --

    /// Shops start pending and inactive; activation requires approval.
    pub fn create_shop(
        &self,
        owner_id: &str,
        name: &str,
        description: &str,
    ) -> Result<String, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO shops (id, name, description, owner_id) VALUES (?1, ?2, ?3, ?4)",
            params![id, name, description, owner_id],
        )?;
        Ok(id)
    }

    pub fn set_shop_status(
        &self,
        shop_id: &str,
        status: ShopStatus,
    ) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let is_active = status == ShopStatus::Approved;
        let changed = conn.execute(
            "UPDATE shops SET status = ?2, is_active = ?3 WHERE id = ?1",
            params![shop_id, status.as_str(), is_active],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound("shop".into()));
        }
        Ok(())
    }

    pub fn shop_is_active(&self, shop_id: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(conn.query_row(
            "SELECT is_active FROM shops WHERE id = ?1",
            params![shop_id],
            |row| row.get(0),
        )?)
    }

    // -- Products --

    pub fn create_product(
        &self,
        seller_id: &str,
        name: &str,
        description: &str,
        price: i64,
        product_type: &str,
        visibility: Visibility,
        dag_id: Option<&str>,
        shop_id: Option<&str>,
    ) -> Result<String, RepositoryError> {
        if visibility == Visibility::PrivateDag && dag_id.is_none() {
            return Err(RepositoryError::Invalid(
                "A DAG is required for DAG-private products".into(),
            ));
        }
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO products (id, name, description, price, seller_id, product_type, \
                                   visibility, dag_id, shop_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                name,
                description,
                price,
                seller_id,
                product_type,
                visibility.as_str(),
                dag_id,
                shop_id
            ],
        )?;
        Ok(id)
    }

    // -- Campaigns --

    pub fn create_campaign(&self, campaign: &NewCampaign) -> Result<String, RepositoryError> {
        if campaign.visibility == Visibility::PrivateDag && campaign.dag_id.is_none() {
            return Err(RepositoryError::Invalid(
                "A DAG is required for DAG-private campaigns".into(),
            ));
        }
        if campaign.goal <= 0 {
            return Err(RepositoryError::Invalid("Goal must be positive".into()));
        }

        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO campaigns (id, title, description, goal, creator_id, end_date, \
                                    campaign_type, visibility, dag_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                campaign.title,
                campaign.description,
                campaign.goal,
                campaign.creator_id,
                campaign.end_date,
                campaign.campaign_type.as_str(),
                campaign.visibility.as_str(),
                campaign.dag_id,
            ],
        )?;
        Ok(id)
    }

    // -- Read side --

    pub fn get_project(&self, project_id: &str) -> Result<Option<Project>, RepositoryError> {
        let conn = self.pool.get()?;
        let project = conn
            .query_row(
                "SELECT id, title, description, status, funding_goal, current_funding, \
                        votes, owner_id, created_at, updated_at \
                 FROM projects WHERE id = ?1",
                params![project_id],
                |row| {
                    Ok(Project {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        status: row.get(3)?,
                        funding_goal: row.get(4)?,
                        current_funding: row.get(5)?,
                        votes: row.get(6)?,
                        owner_id: row.get(7)?,
                        created_at: row.get(8)?,
                        updated_at: row.get(9)?,
                    })
                },
            )
            .optional()?;
        Ok(project)
    }

    pub fn get_dag(&self, dag_id: &str) -> Result<Option<Dag>, RepositoryError> {
        let conn = self.pool.get()?;
        let dag = conn
            .query_row(
                "SELECT id, name, description, dag_type, is_active, member_count, \
                        status, created_at \
                 FROM dags WHERE id = ?1",
                params![dag_id],
                |row| {
                    Ok(Dag {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        dag_type: row.get(3)?,
                        is_active: row.get(4)?,
                        member_count: row.get(5)?,
                        status: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(dag)
    }

    pub fn get_listing(&self, listing_id: &str) -> Result<Option<Listing>, RepositoryError> {
        let conn = self.pool.get()?;
        let listing = conn
            .query_row(
                "SELECT id, title, description, author_id, listing_type, status, price, \
                        currency, views, visibility, creator_type, target_amount, \
                        current_amount, end_date, dag_id, created_at, updated_at \
                 FROM listings WHERE id = ?1",
                params![listing_id],
                |row| {
                    Ok(Listing {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        author_id: row.get(3)?,
                        listing_type: row.get(4)?,
                        status: row.get(5)?,
                        price: row.get(6)?,
                        currency: row.get(7)?,
                        views: row.get(8)?,
                        visibility: row.get(9)?,
                        creator_type: row.get(10)?,
                        target_amount: row.get(11)?,
                        current_amount: row.get(12)?,
                        end_date: row.get(13)?,
                        dag_id: row.get(14)?,
                        created_at: row.get(15)?,
                        updated_at: row.get(16)?,
                    })
                },
            )
            .optional()?;
        Ok(listing)
    }
}
