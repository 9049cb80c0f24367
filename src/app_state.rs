use std::sync::Arc;

use crate::{
    config::Config,
    identity::TokenRegistry,
    services::{BookService, ReviewService, UserService},
    store::{PostgresStore, Store},
};

#[derive(Clone)]
pub struct AppState {
    pub books: BookService,
    pub reviews: ReviewService,
    pub users: UserService,
    pub identity: Arc<TokenRegistry>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            books: BookService::new(store.clone()),
            reviews: ReviewService::new(store.clone()),
            users: UserService::new(store),
            identity: Arc::new(TokenRegistry::new()),
            config,
        }
    }

    /// Connect to Postgres, create tables, and wire up the services.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = PostgresStore::connect(&config.database).await?;
        store.init().await?;
        store.health_check().await?;
        Ok(Self::new(Arc::new(store), config))
    }
}
