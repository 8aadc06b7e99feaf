//! Repository for reminder rules.
//!
//! The scheduler keeps the live copy in memory; a [`RuleStore`] keeps it
//! across restarts. Tests use [`InMemoryRuleStore`], the bot uses
//! [`SqliteRuleStore`].

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::database::models::ReminderRuleRecord;
use crate::services::scheduler::{ReminderError, ReminderRule, SubscriberId};
use crate::utils::logging::{log_database_error, log_database_operation};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored reminder for subscriber {subscriber_id} is invalid: {source}")]
    Corrupt {
        subscriber_id: SubscriberId,
        source: ReminderError,
    },
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn get(&self, subscriber_id: SubscriberId) -> Result<Option<ReminderRule>, StoreError>;

    async fn put(&self, rule: &ReminderRule) -> Result<(), StoreError>;

    /// Returns whether a rule was removed; removing nothing is not an error
    async fn delete(&self, subscriber_id: SubscriberId) -> Result<bool, StoreError>;

    async fn all(&self) -> Result<Vec<ReminderRule>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    rules: RwLock<HashMap<SubscriberId, ReminderRule>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn get(&self, subscriber_id: SubscriberId) -> Result<Option<ReminderRule>, StoreError> {
        Ok(self.rules.read().await.get(&subscriber_id).cloned())
    }

    async fn put(&self, rule: &ReminderRule) -> Result<(), StoreError> {
        self.rules
            .write()
            .await
            .insert(rule.subscriber_id, rule.clone());
        Ok(())
    }

    async fn delete(&self, subscriber_id: SubscriberId) -> Result<bool, StoreError> {
        Ok(self.rules.write().await.remove(&subscriber_id).is_some())
    }

    async fn all(&self) -> Result<Vec<ReminderRule>, StoreError> {
        let mut rules: Vec<ReminderRule> = self.rules.read().await.values().cloned().collect();
        rules.sort_by_key(|r| r.subscriber_id);
        Ok(rules)
    }
}

/// `reminder_rules` table backed store
#[derive(Clone)]
pub struct SqliteRuleStore {
    pool: sqlx::SqlitePool,
}

impl SqliteRuleStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

fn decode(record: ReminderRuleRecord) -> Result<ReminderRule, StoreError> {
    let subscriber_id = record.subscriber_id;
    ReminderRule::try_from(record).map_err(|source| StoreError::Corrupt {
        subscriber_id,
        source,
    })
}

#[async_trait]
impl RuleStore for SqliteRuleStore {
    async fn get(&self, subscriber_id: SubscriberId) -> Result<Option<ReminderRule>, StoreError> {
        ReminderRuleRecord::find_by_subscriber(&self.pool, subscriber_id)
            .await?
            .map(decode)
            .transpose()
    }

    async fn put(&self, rule: &ReminderRule) -> Result<(), StoreError> {
        let record = ReminderRuleRecord::from(rule);
        let details = format!("subscriber {}", rule.subscriber_id);
        log_database_operation("UPSERT", "reminder_rules", Some(&details));

        ReminderRuleRecord::upsert(&self.pool, &record)
            .await
            .map_err(|e| {
                log_database_error("UPSERT", "reminder_rules", &e.to_string(), Some(&details));
                StoreError::from(e)
            })
    }

    async fn delete(&self, subscriber_id: SubscriberId) -> Result<bool, StoreError> {
        log_database_operation(
            "DELETE",
            "reminder_rules",
            Some(&format!("subscriber {subscriber_id}")),
        );
        Ok(ReminderRuleRecord::delete(&self.pool, subscriber_id).await?)
    }

    /// Rows that no longer decode are logged and skipped so one bad record
    /// cannot keep every other subscriber's reminder from loading.
    async fn all(&self) -> Result<Vec<ReminderRule>, StoreError> {
        let records = ReminderRuleRecord::find_all(&self.pool).await?;
        let mut rules = Vec::with_capacity(records.len());
        for record in records {
            match decode(record) {
                Ok(rule) => rules.push(rule),
                Err(e) => log_database_error("LOAD", "reminder_rules", &e.to_string(), None),
            }
        }
        Ok(rules)
    }
}
