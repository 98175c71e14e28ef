use anyhow::{Context, Result};
use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::metrics::SESSIONS_TOTAL;
use crate::models::VisitorSession;
use crate::services::{session_store::SessionStore, AppState};

/// Signing key for the session cookie, derived from the configured secret.
#[derive(Clone)]
pub struct SessionKey(Key);

impl SessionKey {
    pub fn from_secret(secret: &str) -> Self {
        let digest = Sha512::digest(secret.as_bytes());
        Self(Key::from(digest.as_slice()))
    }
}

impl From<SessionKey> for Key {
    fn from(key: SessionKey) -> Self {
        key.0
    }
}

impl FromRef<Arc<AppState>> for SessionKey {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.session_key.clone()
    }
}

pub type SessionJar = SignedCookieJar<SessionKey>;

/// A visitor's session as loaded for one request.
#[derive(Debug)]
pub struct LoadedSession {
    pub id: String,
    pub data: VisitorSession,
    pub is_new: bool,
}

pub struct SessionService {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Resolves the visitor from the signed cookie.
    ///
    /// Unknown, expired, or unreadable sessions come back empty so the pages
    /// start over; only store I/O failures are errors.
    pub async fn load<K>(&self, jar: &SignedCookieJar<K>) -> Result<LoadedSession> {
        let cookie_id = jar
            .get(&self.config.cookie_name)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
            .map(|id| id.to_string());

        let Some(id) = cookie_id else {
            SESSIONS_TOTAL.with_label_values(&["created"]).inc();
            return Ok(LoadedSession {
                id: Uuid::new_v4().to_string(),
                data: VisitorSession::default(),
                is_new: true,
            });
        };

        let payload = self
            .store
            .load(&id)
            .await
            .context("Failed to load visitor session")?;

        let data = match payload {
            Some(payload) => match serde_json::from_str::<VisitorSession>(&payload) {
                Ok(data) => {
                    SESSIONS_TOTAL.with_label_values(&["restored"]).inc();
                    data
                }
                Err(e) => {
                    tracing::warn!("Session {} is unreadable, resetting: {}", id, e);
                    SESSIONS_TOTAL.with_label_values(&["corrupt"]).inc();
                    VisitorSession::default()
                }
            },
            None => {
                tracing::debug!("Session {} expired or unknown", id);
                SESSIONS_TOTAL.with_label_values(&["expired"]).inc();
                VisitorSession::default()
            }
        };

        Ok(LoadedSession {
            id,
            data,
            is_new: false,
        })
    }

    /// Persists the session and refreshes the cookie lifetime.
    pub async fn save<K>(
        &self,
        jar: SignedCookieJar<K>,
        session: &LoadedSession,
    ) -> Result<SignedCookieJar<K>> {
        let payload = serde_json::to_string(&session.data)?;
        self.store
            .save(&session.id, payload, self.config.ttl_seconds)
            .await?;

        if session.is_new {
            tracing::info!("Visitor session created: {}", session.id);
        }

        let cookie = Cookie::build((self.config.cookie_name.clone(), session.id.clone()))
            .path("/")
            .http_only(true)
            .secure(self.config.cookie_secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(
                i64::try_from(self.config.ttl_seconds).unwrap_or(i64::MAX),
            ))
            .build();

        Ok(jar.add(cookie))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlashcardState;
    use crate::services::session_store::MemorySessionStore;

    fn service(store: Arc<MemorySessionStore>) -> SessionService {
        SessionService::new(store, SessionConfig::default())
    }

    fn jar() -> SignedCookieJar {
        SignedCookieJar::new(SessionKey::from_secret("unit-test-secret").into())
    }

    #[tokio::test]
    async fn missing_cookie_starts_a_new_session() {
        let store = Arc::new(MemorySessionStore::new());
        let loaded = service(store).load(&jar()).await.unwrap();

        assert!(loaded.is_new);
        assert_eq!(loaded.data, VisitorSession::default());
        assert!(Uuid::parse_str(&loaded.id).is_ok());
    }

    #[tokio::test]
    async fn saved_session_is_restored_from_cookie() {
        let store = Arc::new(MemorySessionStore::new());
        let service = service(store.clone());

        let mut loaded = service.load(&jar()).await.unwrap();
        loaded.data.flashcards = Some(FlashcardState {
            index: 2,
            ..Default::default()
        });
        let jar = service.save(jar(), &loaded).await.unwrap();
        assert_eq!(store.len().await, 1);

        let cookie = jar.get("quiz_session").unwrap();
        assert_eq!(cookie.value(), loaded.id);

        let restored = service.load(&jar).await.unwrap();
        assert!(!restored.is_new);
        assert_eq!(restored.id, loaded.id);
        assert_eq!(restored.data, loaded.data);
    }

    #[tokio::test]
    async fn corrupt_payload_is_replaced_with_empty_session() {
        let store = Arc::new(MemorySessionStore::new());
        let service = service(store.clone());

        let id = Uuid::new_v4().to_string();
        store
            .save(&id, "{not json".to_string(), 60)
            .await
            .unwrap();
        let jar = jar().add(Cookie::new("quiz_session", id.clone()));

        let loaded = service.load(&jar).await.unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.data, VisitorSession::default());
    }

    #[test]
    fn key_derivation_is_deterministic() {
        let a: Key = SessionKey::from_secret("same").into();
        let b: Key = SessionKey::from_secret("same").into();
        let c: Key = SessionKey::from_secret("other").into();
        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }
}
