use std::sync::Arc;

use trade_journal_core::AppConfig;
use trade_journal_data::{Database, Repositories};

use crate::auth::TokenSigner;

/// Shared handler state. Cloned per request; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub repos: Arc<Repositories>,
    pub config: Arc<AppConfig>,
    pub signer: Arc<TokenSigner>,
}

impl AppState {
    #[must_use]
    pub fn new(db: Database, config: AppConfig) -> Self {
        let repos = Repositories::new(db.pool().clone());
        let signer = TokenSigner::from_config(&config.auth);
        Self {
            db,
            repos: Arc::new(repos),
            config: Arc::new(config),
            signer: Arc::new(signer),
        }
    }
}
