//! Passwordless login codes: 6-digit numeric, single use, time boxed.

use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::auth::session;
use crate::repository::RepositoryError;
use crate::state::DbPool;

pub const CODE_LEN: usize = 6;

/// Uniform random digit per position.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Persist a fresh code for the email and return it. The row is written
/// before any delivery attempt; a failed send leaves it valid for resend.
pub fn issue_code(pool: &DbPool, email: &str) -> Result<String, RepositoryError> {
    let conn = pool.get()?;
    let code = generate_code();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO password_resets (id, email, code) VALUES (?1, ?2, ?3)",
        params![id, email, code],
    )?;

    Ok(code)
}

/// Verify a submitted code and establish the authenticated session in one
/// transaction. Returns the session token on success, `None` on any failure
/// (no match, expired, already used, unknown account). Callers surface a
/// single generic message and must not distinguish the reasons.
pub fn verify_code_and_authenticate(
    pool: &DbPool,
    email: &str,
    code: &str,
    ttl_minutes: i64,
    session_hours: u64,
) -> Result<Option<String>, RepositoryError> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    // Most recently issued unused code matching (email, submitted code).
    let reset: Option<(String, bool)> = tx
        .query_row(
            "SELECT id, created_at >= datetime('now', ?3) \
             FROM password_resets \
             WHERE email = ?1 AND code = ?2 AND used = 0 \
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            params![email, code, format!("-{} minutes", ttl_minutes)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((reset_id, fresh)) = reset else {
        return Ok(None);
    };
    if !fresh {
        return Ok(None);
    }

    let user_id: Option<String> = tx
        .query_row(
            "SELECT id FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .optional()?;
    let Some(user_id) = user_id else {
        return Ok(None);
    };

    tx.execute(
        "UPDATE password_resets SET used = 1 WHERE id = ?1",
        params![reset_id],
    )?;
    let token = session::insert_session(&tx, &user_id, session_hours)?;
    tx.commit()?;

    Ok(Some(token))
}

/// Password login: returns the user id when the account exists, has a
/// password set, and the hash verifies. All failure modes collapse to `None`.
pub fn authenticate_password(
    pool: &DbPool,
    email: &str,
    password: &str,
) -> Result<Option<String>, RepositoryError> {
    let conn = pool.get()?;
    let row: Option<(String, Option<String>)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match row {
        Some((user_id, Some(hash))) if crate::auth::password::verify_password(password, &hash) => {
            Ok(Some(user_id))
        }
        _ => Ok(None),
    }
}
