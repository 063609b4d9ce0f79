use std::sync::Arc;

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::Session;
use crate::store::SessionRepository;

pub const SESSION_COOKIE: &str = "tasker.sid";

/// Contents of the signed cookie. The session record itself stays server-side;
/// the cookie only points at it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub sid: String,
    pub exp: usize,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionRepository>,
    secret: String,
    lifetime: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionRepository>, secret: &str, lifetime_hours: i64) -> Self {
        Self {
            store,
            secret: secret.to_string(),
            lifetime: Duration::hours(lifetime_hours),
        }
    }

    /// Persists a new session for `user_id` and returns it with its cookie value.
    pub async fn start(&self, user_id: &str) -> Result<(Session, String), StoreError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + self.lifetime,
        };
        let claims = Claims {
            sub: session.user_id.clone(),
            sid: session.id.clone(),
            exp: session.expires_at.timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?;
        self.store.create(&session).await?;
        Ok((session, token))
    }

    /// Maps a cookie value to a live session. Bad signatures, expired tokens
    /// and destroyed sessions all come back as `Ok(None)`.
    pub async fn resolve(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let Some(claims) = self.verify(token) else {
            return Ok(None);
        };
        let session = self.store.find(&claims.sid, Utc::now()).await?;
        Ok(session.filter(|s| s.user_id == claims.sub))
    }

    /// Destroys the session behind `token`, if any.
    pub async fn end(&self, token: &str) -> Result<bool, StoreError> {
        match self.verify(token) {
            Some(claims) => self.store.delete(&claims.sid).await,
            None => Ok(false),
        }
    }

    fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        ) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!("Rejected session cookie: {}", e);
                None
            }
        }
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(CookieDuration::seconds(self.lifetime.num_seconds()))
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .finish();
        cookie.make_removal();
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;

    fn manager(secret: &str) -> SessionManager {
        SessionManager::new(Arc::new(MemorySessionStore::new()), secret, 24)
    }

    #[tokio::test]
    async fn start_then_resolve() {
        let sessions = manager("s3cret");
        let (session, token) = sessions.start("user-1").await.unwrap();
        let resolved = sessions.resolve(&token).await.unwrap().unwrap();
        assert_eq!(resolved.id, session.id);
        assert_eq!(resolved.user_id, "user-1");
        assert_eq!((session.expires_at - session.created_at).num_hours(), 24);
    }

    #[tokio::test]
    async fn ended_sessions_no_longer_resolve() {
        let sessions = manager("s3cret");
        let (_, token) = sessions.start("user-1").await.unwrap();
        assert!(sessions.end(&token).await.unwrap());
        assert!(sessions.resolve(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tokens_signed_with_another_secret_are_ignored() {
        let store: Arc<dyn SessionRepository> = Arc::new(MemorySessionStore::new());
        let ours = SessionManager::new(store.clone(), "ours", 24);
        let theirs = SessionManager::new(store, "theirs", 24);
        let (_, token) = theirs.start("user-1").await.unwrap();
        assert!(ours.resolve(&token).await.unwrap().is_none());
        assert!(ours.resolve("garbage").await.unwrap().is_none());
    }

    #[test]
    fn cookie_is_http_only() {
        let cookie = manager("x").cookie("token".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(CookieDuration::hours(24)));
    }
}
