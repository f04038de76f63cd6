use std::sync::Arc;

use actix_web::web::{Data, JsonConfig, ServiceConfig};

use crate::{
    auth::guard::AccessGuard,
    config::Config,
    error::AppError,
    service::{
        lifecycle::{Clock, RequestLifecycle},
        roster::Roster,
    },
    store::Store,
};

/// Shared handler state, built once and cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    pub config: Data<Config>,
    pub store: Data<dyn Store>,
    pub guard: Data<AccessGuard>,
    pub lifecycle: Data<RequestLifecycle>,
    pub roster: Data<Roster>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        Self::with_clock(config, store, chrono::Utc::now)
    }

    pub fn with_clock(config: Config, store: Arc<dyn Store>, clock: Clock) -> Self {
        let guard = AccessGuard::new(
            store.clone(),
            config.role_cache_ttl,
            config.role_cache_capacity,
        );
        let lifecycle = RequestLifecycle::new(store.clone()).with_clock(clock);
        let roster = Roster::new(store.clone(), clock);

        Self {
            config: Data::new(config),
            store: Data::from(store),
            guard: Data::new(guard),
            lifecycle: Data::new(lifecycle),
            roster: Data::new(roster),
        }
    }

    pub fn register(&self, cfg: &mut ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.store.clone())
            .app_data(self.guard.clone())
            .app_data(self.lifecycle.clone())
            .app_data(self.roster.clone())
            .app_data(
                JsonConfig::default()
                    .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
            );
    }
}
