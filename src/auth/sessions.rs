//! Server-side sessions. The client holds a random token in an `HttpOnly`
//! cookie; the database only ever sees its SHA-256 digest.

use anyhow::Context;
use axum::{
    async_trait,
    http::{header::InvalidHeaderValue, HeaderMap, HeaderValue},
};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

pub const SESSION_COOKIE_NAME: &str = "profilebook_session";

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, token_hash: &[u8], user_id: Uuid) -> anyhow::Result<()>;
    async fn lookup(&self, token_hash: &[u8]) -> anyhow::Result<Option<Uuid>>;
    /// Deleting an unknown session is not an error.
    async fn delete(&self, token_hash: &[u8]) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgSessionStore {
    db: PgPool,
}

impl PgSessionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, token_hash: &[u8], user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO user_sessions (session_hash, user_id) VALUES ($1, $2)")
            .bind(token_hash)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("insert session")?;
        Ok(())
    }

    async fn lookup(&self, token_hash: &[u8]) -> anyhow::Result<Option<Uuid>> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM user_sessions WHERE session_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.db)
        .await
        .context("lookup session")?;
        Ok(user_id)
    }

    async fn delete(&self, token_hash: &[u8]) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM user_sessions WHERE session_hash = $1")
            .bind(token_hash)
            .execute(&self.db)
            .await
            .context("delete session")?;
        Ok(())
    }
}

/// 32 bytes from the OS RNG, base64url without padding.
pub fn generate_session_token() -> anyhow::Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

pub fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// No `Max-Age`: the cookie lives for the browser session, the server-side
/// record until logout.
pub fn session_cookie(token: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn clear_session_cookie(secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(axum::http::header::COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            let val = val.trim();
            if key.trim() == SESSION_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn tokens_are_random_and_url_safe() {
        let a = generate_session_token().unwrap();
        let b = generate_session_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn token_hash_is_stable_sha256() {
        assert_eq!(hash_session_token("abc"), hash_session_token("abc"));
        assert_ne!(hash_session_token("abc"), hash_session_token("abd"));
        assert_eq!(hash_session_token("abc").len(), 32);
    }

    #[test]
    fn extracts_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; profilebook_session=tok123; lang=en"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("profilebook_session="));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn cookie_attributes() {
        let set = session_cookie("tok", false).unwrap();
        let set = set.to_str().unwrap();
        assert!(set.starts_with("profilebook_session=tok;"));
        assert!(set.contains("HttpOnly"));
        assert!(!set.contains("Secure"));

        let cleared = clear_session_cookie(true).unwrap();
        let cleared = cleared.to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));
        assert!(cleared.ends_with("; Secure"));
    }
}
