use crate::config::Config;
use axum::extract::FromRef;
use sqlx::SqlitePool;

/// Explicitly constructed application state, passed into the router.
/// No process-wide store singletons; tests build their own.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
