pub mod api;
pub mod cli;
pub mod client;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod policy;
pub mod services;
pub mod validation;

pub use db::DbPool;

use clock::Clock;
use config::Config;
use std::sync::Arc;

use crate::api::rate_limit::RateLimiter;
use crate::services::{AuthService, MemberService};

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub clock: Arc<dyn Clock>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, clock: Arc<dyn Clock>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        Self {
            config,
            db,
            clock,
            rate_limiter,
        }
    }

    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.db, &self.config, self.clock.as_ref())
    }

    pub fn members(&self) -> MemberService<'_> {
        MemberService::new(&self.db, &self.config, self.clock.as_ref())
    }
}
