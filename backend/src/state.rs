use crate::{config::Config, db::connection::DbPool, services::cache::Cache};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub cache: Cache,
    pub config: Config,
}

impl AppState {
    pub fn new(pool: DbPool, cache: Cache, config: Config) -> Self {
        Self {
            pool,
            cache,
            config,
        }
    }
}
