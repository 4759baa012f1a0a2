use crate::{auth::AuthService, db::Database, utils::Config};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub auth_service: Arc<AuthService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the authentication service to `db` using the hashing parameters
    /// from `config`.
    pub fn new(db: Arc<dyn Database>, config: Config) -> anyhow::Result<Self> {
        let auth_service = Arc::new(AuthService::new(db.clone(), &config.hashing)?);

        Ok(Self {
            db,
            auth_service,
            config: Arc::new(config),
        })
    }
}
