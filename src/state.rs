use chrono::Duration;

use crate::access::MutationPolicy;
use crate::auth::SessionSettings;
use crate::config::Config;
use crate::store::Store;

/// Shared application state, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub session: SessionSettings,
    pub bcrypt_cost: u32,
    pub mutation_policy: MutationPolicy,
}

impl AppState {
    /// State with the default bcrypt cost and mutation policy.
    pub fn new(store: Store, session: SessionSettings) -> Self {
        Self {
            store,
            session,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            mutation_policy: MutationPolicy::default(),
        }
    }

    pub fn from_config(store: Store, config: &Config) -> Self {
        let session = SessionSettings::new(
            config.session_cookie_name.clone(),
            config.session_secret.as_bytes(),
            Duration::hours(config.session_ttl_hours),
        );
        Self::new(store, session)
            .with_bcrypt_cost(config.bcrypt_cost)
            .with_mutation_policy(config.mutation_policy)
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn with_mutation_policy(mut self, policy: MutationPolicy) -> Self {
        self.mutation_policy = policy;
        self
    }
}
