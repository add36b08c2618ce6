//! Persistence operations for the social feed. All consistency rules the
//! database cannot express on its own (parent/post agreement, slug
//! pre-checks) live here.

use rusqlite::{params, OptionalExtension};

use crate::db::models::{Channel, Comment, Post};
use crate::repository::{constraint_to_conflict, RepositoryError};
use crate::social::domain::*;
use crate::state::DbPool;

pub struct SocialRepository {
    pool: DbPool,
}

impl SocialRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a channel. Uniqueness is on the normalized slug; the advisory
    /// pre-check gives a friendly message, the UNIQUE index settles races.
    pub fn create_channel(&self, channel: &NewChannel) -> Result<String, RepositoryError> {
        if channel.channel_type == ChannelType::Dag || channel.visibility == Visibility::PrivateDag
        {
            if channel.dag_id.is_none() {
                return Err(RepositoryError::Invalid(
                    "A DAG is required for this channel".into(),
                ));
            }
        }

        let slug = slugify(&channel.name);
        if slug.is_empty() {
            return Err(RepositoryError::Invalid("Channel name is required".into()));
        }

        let conn = self.pool.get()?;
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM channels WHERE slug = ?1",
            params![slug],
            |row| row.get(0),
        )?;
        if exists {
            return Err(RepositoryError::Conflict(
                "A channel with this name already exists".into(),
            ));
        }

        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO channels (id, name, description, slug, owner_id, channel_type, visibility, dag_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                channel.name,
                channel.description,
                slug,
                channel.owner_id,
                channel.channel_type.as_str(),
                channel.visibility.as_str(),
                channel.dag_id,
            ],
        )
        .map_err(|e| {
            constraint_to_conflict(e.into(), "A channel with this name already exists")
        })?;

        Ok(id)
    }

    pub fn follow_channel(&self, user_id: &str, channel_id: &str) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO channel_followers (user_id, channel_id) VALUES (?1, ?2)",
            params![user_id, channel_id],
        )?;
        Ok(())
    }

    pub fn unfollow_channel(&self, user_id: &str, channel_id: &str) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM channel_followers WHERE user_id = ?1 AND channel_id = ?2",
            params![user_id, channel_id],
        )?;
        Ok(())
    }

    pub fn follower_count(&self, channel_id: &str) -> Result<i64, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM channel_followers WHERE channel_id = ?1",
            params![channel_id],
            |row| row.get(0),
        )?)
    }

    pub fn add_moderator(
        &self,
        channel_id: &str,
        user_id: &str,
        role: &str,
    ) -> Result<String, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO channel_moderators (id, channel_id, user_id, role) VALUES (?1, ?2, ?3, ?4)",
            params![id, channel_id, user_id, role],
        )
        .map_err(|e| constraint_to_conflict(e.into(), "Already a moderator of this channel"))?;
        Ok(id)
    }

    pub fn create_post(&self, post: &NewPost) -> Result<String, RepositoryError> {
        let conn = self.pool.get()?;
        let channel_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM channels WHERE id = ?1",
            params![post.channel_id],
            |row| row.get(0),
        )?;
        if !channel_exists {
            return Err(RepositoryError::NotFound("channel".into()));
        }

        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO posts (id, author_id, channel_id, title, content, post_type, \
                                media_url, external_url, poll_ends_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                post.author_id,
                post.channel_id,
                post.title,
                post.content,
                post.post_type.as_str(),
                post.media_url,
                post.external_url,
                post.poll_ends_at,
            ],
        )?;
        Ok(id)
    }

    pub fn set_post_status(&self, post_id: &str, status: PostStatus) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE posts SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![post_id, status.as_str()],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound("post".into()));
        }
        Ok(())
    }

    /// Create a poll post with its ordered options, atomically.
    pub fn create_poll(
        &self,
        post: &NewPost,
        options: &[&str],
    ) -> Result<String, RepositoryError> {
        if post.post_type != PostType::Poll {
            return Err(RepositoryError::Invalid("not a poll post".into()));
        }
        if options.len() < 2 {
            return Err(RepositoryError::Invalid(
                "A poll needs at least two options".into(),
            ));
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let post_id = uuid::Uuid::now_v7().to_string();
        tx.execute(
            "INSERT INTO posts (id, author_id, channel_id, title, content, post_type, poll_ends_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                post_id,
                post.author_id,
                post.channel_id,
                post.title,
                post.content,
                PostType::Poll.as_str(),
                post.poll_ends_at,
            ],
        )?;

        for (position, text) in options.iter().enumerate() {
            let option_id = uuid::Uuid::now_v7().to_string();
            tx.execute(
                "INSERT INTO poll_options (id, post_id, text, position) VALUES (?1, ?2, ?3, ?4)",
                params![option_id, post_id, text, position as i64],
            )?;
        }

        tx.commit()?;
        Ok(post_id)
    }

    /// Add a comment, optionally nested. The parent must be an existing
    /// comment on the same post.
    pub fn add_comment(
        &self,
        post_id: &str,
        author_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<String, RepositoryError> {
        let conn = self.pool.get()?;

        if let Some(parent) = parent_id {
            let parent_post: Option<String> = conn
                .query_row(
                    "SELECT post_id FROM comments WHERE id = ?1",
                    params![parent],
                    |row| row.get(0),
                )
                .optional()?;
            match parent_post {
                None => return Err(RepositoryError::NotFound("parent comment".into())),
                Some(p) if p != post_id => {
                    return Err(RepositoryError::Invalid(
                        "Parent comment belongs to a different post".into(),
                    ))
                }
                Some(_) => {}
            }
        }

        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO comments (id, content, author_id, post_id, parent_id) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, content, author_id, post_id, parent_id],
        )?;
        Ok(id)
    }

    pub fn set_comment_status(
        &self,
        comment_id: &str,
        status: CommentStatus,
    ) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE comments SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![comment_id, status.as_str()],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound("comment".into()));
        }
        Ok(())
    }

    /// Nesting depth, computed on read by walking parent links. A top-level
    /// comment has depth 0. There is no enforced limit.
    pub fn comment_depth(&self, comment_id: &str) -> Result<i64, RepositoryError> {
        let conn = self.pool.get()?;
        let mut depth = 0i64;
        let mut current = comment_id.to_string();
        loop {
            let parent: Option<String> = conn
                .query_row(
                    "SELECT parent_id FROM comments WHERE id = ?1",
                    params![current],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| RepositoryError::NotFound("comment".into()))?;
            match parent {
                Some(p) => {
                    depth += 1;
                    current = p;
                }
                None => return Ok(depth),
            }
        }
    }

    /// React to exactly one of a post or a comment. Duplicate reactions from
    /// the same user to the same target are conflicts.
    pub fn react(
        &self,
        user_id: &str,
        target: &ReactionTarget,
        kind: ReactionKind,
    ) -> Result<String, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO reactions (id, user_id, post_id, comment_id, kind) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, user_id, target.post_id(), target.comment_id(), kind.as_str()],
        )
        .map_err(|e| constraint_to_conflict(e.into(), "Already reacted"))?;
        Ok(id)
    }

    pub fn reaction_count(&self, target: &ReactionTarget) -> Result<i64, RepositoryError> {
        let conn = self.pool.get()?;
        let count = match target {
            ReactionTarget::Post(id) => conn.query_row(
                "SELECT COUNT(*) FROM reactions WHERE post_id = ?1",
                params![id],
                |row| row.get(0),
            )?,
            ReactionTarget::Comment(id) => conn.query_row(
                "SELECT COUNT(*) FROM reactions WHERE comment_id = ?1",
                params![id],
                |row| row.get(0),
            )?,
        };
        Ok(count)
    }

    /// Record a vote. Uniqueness is per (user, option): a user may vote for
    /// several options of the same poll.
    pub fn vote(&self, user_id: &str, option_id: &str) -> Result<String, RepositoryError> {
        let conn = self.pool.get()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO poll_votes (id, user_id, option_id) VALUES (?1, ?2, ?3)",
            params![id, user_id, option_id],
        )
        .map_err(|e| constraint_to_conflict(e.into(), "Already voted for this option"))?;
        Ok(id)
    }

    /// Option texts and vote counts in display order.
    pub fn poll_results(&self, post_id: &str) -> Result<Vec<(String, i64)>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT o.text, COUNT(v.id) FROM poll_options o \
             LEFT JOIN poll_votes v ON v.option_id = o.id \
             WHERE o.post_id = ?1 \
             GROUP BY o.id ORDER BY o.position",
        )?;
        let results = stmt
            .query_map(params![post_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }

    pub fn poll_option_ids(&self, post_id: &str) -> Result<Vec<String>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM poll_options WHERE post_id = ?1 ORDER BY position",
        )?;
        let ids = stmt
            .query_map(params![post_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // -- Read side --

    pub fn get_channel(&self, channel_id: &str) -> Result<Option<Channel>, RepositoryError> {
        let conn = self.pool.get()?;
        let channel = conn
            .query_row(
                "SELECT id, name, description, slug, owner_id, channel_type, visibility, \
                        dag_id, created_at, updated_at \
                 FROM channels WHERE id = ?1",
                params![channel_id],
                |row| {
                    Ok(Channel {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        slug: row.get(3)?,
                        owner_id: row.get(4)?,
                        channel_type: row.get(5)?,
                        visibility: row.get(6)?,
                        dag_id: row.get(7)?,
                        created_at: row.get(8)?,
                        updated_at: row.get(9)?,
                    })
                },
            )
            .optional()?;
        Ok(channel)
    }

    pub fn get_post(&self, post_id: &str) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                "SELECT id, author_id, channel_id, title, content, post_type, status, \
                        media_url, external_url, poll_ends_at, created_at, updated_at \
                 FROM posts WHERE id = ?1",
                params![post_id],
                |row| {
                    Ok(Post {
                        id: row.get(0)?,
                        author_id: row.get(1)?,
                        channel_id: row.get(2)?,
                        title: row.get(3)?,
                        content: row.get(4)?,
                        post_type: row.get(5)?,
                        status: row.get(6)?,
                        media_url: row.get(7)?,
                        external_url: row.get(8)?,
                        poll_ends_at: row.get(9)?,
                        created_at: row.get(10)?,
                        updated_at: row.get(11)?,
                    })
                },
            )
            .optional()?;
        Ok(post)
    }

    pub fn get_comment(&self, comment_id: &str) -> Result<Option<Comment>, RepositoryError> {
        let conn = self.pool.get()?;
        let comment = conn
            .query_row(
                "SELECT id, content, author_id, post_id, parent_id, status, \
                        created_at, updated_at \
                 FROM comments WHERE id = ?1",
                params![comment_id],
                |row| {
                    Ok(Comment {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        author_id: row.get(2)?,
                        post_id: row.get(3)?,
                        parent_id: row.get(4)?,
                        status: row.get(5)?,
                        created_at: row.get(6)?,
                        updated_at: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(comment)
    }
}
