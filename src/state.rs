use std::sync::Arc;

use crate::clock::Clock;
use crate::config::Config;
use crate::email::ResetNotifier;
use crate::rate_limit::AttemptLimiter;
use crate::store::Store;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn ResetNotifier>,
    pub login_limiter: AttemptLimiter,
    pub reset_limiter: AttemptLimiter,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        config: Config,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Self {
        Self {
            store,
            config,
            clock,
            notifier,
            login_limiter: AttemptLimiter::for_logins(),
            reset_limiter: AttemptLimiter::for_password_resets(),
        }
    }
}
