use std::sync::Arc;

use crate::config::Config;
use crate::db::MongoDB;
use crate::session::SessionManager;
use crate::store::{
    MemorySessionStore, MemoryTaskStore, MemoryUserStore, MongoSessionStore, MongoTaskStore,
    MongoUserStore, TaskRepository, UserRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<dyn TaskRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: SessionManager,
    pub config: Config,
}

impl AppState {
    pub fn with_mongo(mongodb: &MongoDB, config: Config) -> Self {
        Self {
            tasks: Arc::new(MongoTaskStore::new(mongodb)),
            users: Arc::new(MongoUserStore::new(mongodb)),
            sessions: SessionManager::new(
                Arc::new(MongoSessionStore::new(mongodb)),
                &config.session_secret,
                config.session_ttl_hours,
            ),
            config,
        }
    }

    pub fn in_memory(config: Config) -> Self {
        Self {
            tasks: Arc::new(MemoryTaskStore::new()),
            users: Arc::new(MemoryUserStore::new()),
            sessions: SessionManager::new(
                Arc::new(MemorySessionStore::new()),
                &config.session_secret,
                config.session_ttl_hours,
            ),
            config,
        }
    }
}
