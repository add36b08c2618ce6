use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::repository::RepositoryError;
use crate::state::DbPool;

/// Create a new authenticated session. Returns the session token.
pub fn create_session(
    pool: &DbPool,
    user_id: &str,
    hours: u64,
) -> Result<String, RepositoryError> {
    let conn = pool.get()?;
    Ok(insert_session(&conn, user_id, hours)?)
}

/// Insert an authenticated session on an existing connection, so callers can
/// include it in a larger transaction.
pub fn insert_session(
    conn: &Connection,
    user_id: &str,
    hours: u64,
) -> Result<String, rusqlite::Error> {
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) \
         VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Create a pre-verification login session carrying the pending email.
/// Expires with the verification code.
pub fn create_login_session(
    pool: &DbPool,
    email: &str,
    ttl_minutes: i64,
) -> Result<String, RepositoryError> {
    let conn = pool.get()?;
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, token, pending_email, expires_at) \
         VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, token, email, format!("+{} minutes", ttl_minutes)],
    )?;

    Ok(token)
}

/// Pending email for an unexpired login session, if any.
pub fn pending_email(pool: &DbPool, token: &str) -> Result<Option<String>, RepositoryError> {
    let conn = pool.get()?;
    let email = conn
        .query_row(
            "SELECT pending_email FROM sessions \
             WHERE token = ?1 AND user_id IS NULL \
               AND pending_email IS NOT NULL \
               AND expires_at > datetime('now')",
            params![token],
            |row| row.get(0),
        )
        .optional()?;
    Ok(email)
}

/// Delete a session by token.
pub fn delete_session(pool: &DbPool, token: &str) -> Result<(), RepositoryError> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn seed_user(pool: &DbPool, username: &str, email: &str) -> String {
        let conn = pool.get().unwrap();
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO users (id, username, email) VALUES (?1, ?2, ?3)",
            params![id, username, email],
        )
        .unwrap();
        id
    }

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn login_session_carries_pending_email() {
        let pool = test_pool();
        let token = create_login_session(&pool, "a@x.com", 30).unwrap();
        assert_eq!(
            pending_email(&pool, &token).unwrap().as_deref(),
            Some("a@x.com")
        );
    }

    #[test]
    fn authenticated_session_has_no_pending_email() {
        let pool = test_pool();
        let user_id = seed_user(&pool, "alice", "alice@x.com");
        let token = create_session(&pool, &user_id, 168).unwrap();
        assert_eq!(pending_email(&pool, &token).unwrap(), None);
    }

    #[test]
    fn deleted_session_is_gone() {
        let pool = test_pool();
        let token = create_login_session(&pool, "a@x.com", 30).unwrap();
        delete_session(&pool, &token).unwrap();
        assert_eq!(pending_email(&pool, &token).unwrap(), None);
    }
}
