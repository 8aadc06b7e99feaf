/// Command handlers grouped by feature
pub mod commands;
/// Update routing
pub mod handlers;
/// Free text and commands mapped to one intent type
pub mod intent;
/// Reply and inline keyboards
pub mod keyboards;

use std::sync::Arc;

use crate::database::connection::DatabaseManager;
use crate::services::countdown::CountdownEngine;
use crate::services::subscription::SubscriptionService;

/// Everything a handler needs, cloned into each endpoint
#[derive(Clone)]
pub struct AppContext {
    pub db: DatabaseManager,
    pub engine: CountdownEngine,
    pub subscriptions: Arc<SubscriptionService>,
}

impl AppContext {
    pub fn new(
        db: DatabaseManager,
        engine: CountdownEngine,
        subscriptions: Arc<SubscriptionService>,
    ) -> Self {
        Self {
            db,
            engine,
            subscriptions,
        }
    }
}
