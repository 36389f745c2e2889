use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::{NewSession, User};
use crate::schema::{sessions, users};
use chrono::{Duration, Utc};
use diesel::prelude::*;

use super::crypto::{generate_token, hash_token};

/// Days a freshly issued token stays valid unless configured otherwise.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

/// Issue a new opaque token for `user_id`. Only the SHA-256 digest is stored.
pub fn create_session(
    conn: &mut SqliteConnection,
    user_id: i32,
    ttl_days: i64,
) -> Result<String, diesel::result::Error> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = (Utc::now() + Duration::days(ttl_days)).naive_utc();

    let new_session = NewSession {
        user_id,
        token_hash: &token_hash,
        expires_at,
    };

    diesel::insert_into(sessions::table)
        .values(&new_session)
        .execute(conn)?;

    Ok(token)
}

/// Resolve a token to its active user. `Ok(None)` means the token is unknown
/// or expired; database failures are errors.
pub async fn get_user_from_token(
    pool: &DbPool,
    token: &str,
) -> Result<Option<User>, ApiError> {
    let mut conn = pool.get()?;
    let token_hash = hash_token(token);

    let user = sessions::table
        .inner_join(users::table)
        .filter(sessions::token_hash.eq(&token_hash))
        .filter(sessions::expires_at.gt(Utc::now().naive_utc()))
        .filter(users::is_active.eq(true))
        .select(User::as_select())
        .first(&mut conn)
        .optional()?;

    Ok(user)
}
