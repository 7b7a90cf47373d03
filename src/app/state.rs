//! Application state shared across routes

use std::sync::Arc;

use parking_lot::Mutex;

use crate::catalog::{CatalogPaths, ConsistencyCoordinator};
use crate::config::Config;
use crate::session::{Credentials, SessionStore};
use crate::store::StoreError;
use crate::util::rate_limit::LoginThrottle;

/// Upper bound on session lifetime (one year)
const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// One reload-mutate-save cycle at a time
    pub catalog: Arc<Mutex<ConsistencyCoordinator>>,
    pub sessions: SessionStore,
    pub login_throttle: LoginThrottle,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, StoreError> {
        let config = Arc::new(config);

        // Load both tables up front so a broken file fails startup
        let paths = CatalogPaths::new(&config.data_dir, &config.inventory_file, &config.supplier_file);
        let catalog = Arc::new(Mutex::new(ConsistencyCoordinator::open(paths)?));

        let sessions = SessionStore::new(
            Credentials {
                username: config.admin_username.clone(),
                password: config.admin_password.clone(),
            },
            chrono::Duration::seconds(config.session_ttl_secs.min(MAX_SESSION_TTL_SECS) as i64),
        );

        let login_throttle = LoginThrottle::new(config.login_rate_limit);

        Ok(Self {
            config,
            catalog,
            sessions,
            login_throttle,
        })
    }
}
