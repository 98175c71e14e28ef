use crate::config::Config;
use crate::models::Catalog;
use std::sync::Arc;

use session_service::SessionKey;
use session_store::{MemorySessionStore, RedisSessionStore, SessionStore};

pub struct AppState {
    pub config: Config,
    pub catalog: Catalog,
    pub store: Arc<dyn SessionStore>,
    pub session_key: SessionKey,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn SessionStore> = match config.redis_uri.as_deref() {
            Some(uri) => Arc::new(RedisSessionStore::connect(uri).await?),
            None => {
                tracing::info!("No Redis URI configured, keeping sessions in memory");
                Arc::new(MemorySessionStore::new())
            }
        };

        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn SessionStore>) -> anyhow::Result<Self> {
        let catalog = Catalog::builtin()?;
        tracing::info!(
            "Catalog loaded: {} puzzles, {} flashcards",
            catalog.puzzle_count(),
            catalog.flashcard_count()
        );

        let session_key = SessionKey::from_secret(&config.secret_key);

        Ok(Self {
            config,
            catalog,
            store,
            session_key,
        })
    }
}

pub mod flashcard_deck;
pub mod puzzle_game;
pub mod session_service;
pub mod session_store;
