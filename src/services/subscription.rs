use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::database::store::{RuleStore, StoreError};
use crate::services::scheduler::{
    Recurrence, ReminderError, ReminderRule, ReminderScheduler, SubscriberId, SubscriberSnapshot,
    TimeOfDay, DEFAULT_REMINDER_TIME,
};

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error(transparent)]
    Rule(#[from] ReminderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Single writer for reminder rules.
///
/// Every change is applied to the in-memory scheduler and written to the
/// store while holding one lock, so concurrent requests for the same
/// subscriber cannot persist out of order. A failed write rolls the
/// scheduler back.
pub struct SubscriptionService {
    scheduler: Arc<ReminderScheduler>,
    store: Arc<dyn RuleStore>,
    writer: Mutex<()>,
}

impl SubscriptionService {
    pub fn new(scheduler: Arc<ReminderScheduler>, store: Arc<dyn RuleStore>) -> Self {
        Self {
            scheduler,
            store,
            writer: Mutex::new(()),
        }
    }

    pub fn scheduler(&self) -> &Arc<ReminderScheduler> {
        &self.scheduler
    }

    /// Loads every persisted rule into the scheduler
    pub async fn restore(&self) -> Result<usize, SubscriptionError> {
        let _guard = self.writer.lock().await;
        let rules = self.store.all().await?;
        let loaded = self.scheduler.load(rules);
        info!("Restored {} reminder rules", loaded);
        Ok(loaded)
    }

    pub fn get(&self, subscriber_id: SubscriberId) -> Option<ReminderRule> {
        self.scheduler.get(subscriber_id)
    }

    pub async fn upsert(
        &self,
        subscriber_id: SubscriberId,
        exams: impl IntoIterator<Item = String>,
        time_of_day: TimeOfDay,
        recurrence: Recurrence,
    ) -> Result<ReminderRule, SubscriptionError> {
        let _guard = self.writer.lock().await;
        let previous = self.scheduler.snapshot(subscriber_id);
        let rule = self
            .scheduler
            .upsert(subscriber_id, exams, time_of_day, recurrence)?;

        self.persist(subscriber_id, previous, &rule).await?;
        Ok(rule)
    }

    /// `Ok(None)` when the subscriber has no rule
    pub async fn disable(
        &self,
        subscriber_id: SubscriberId,
    ) -> Result<Option<ReminderRule>, SubscriptionError> {
        self.set_enabled(subscriber_id, false).await
    }

    pub async fn enable(
        &self,
        subscriber_id: SubscriberId,
    ) -> Result<Option<ReminderRule>, SubscriptionError> {
        self.set_enabled(subscriber_id, true).await
    }

    /// Re-enables the subscriber's rule, or creates a daily one for
    /// `default_exam` at [`DEFAULT_REMINDER_TIME`] when there is none.
    /// The flag is `true` when a rule was created.
    pub async fn enable_or_create(
        &self,
        subscriber_id: SubscriberId,
        default_exam: String,
    ) -> Result<(ReminderRule, bool), SubscriptionError> {
        let _guard = self.writer.lock().await;
        let previous = self.scheduler.snapshot(subscriber_id);
        let (rule, created) = match self.scheduler.enable(subscriber_id) {
            Some(rule) => (rule, false),
            None => {
                let rule = self.scheduler.upsert(
                    subscriber_id,
                    [default_exam],
                    DEFAULT_REMINDER_TIME,
                    Recurrence::EveryDay,
                )?;
                (rule, true)
            }
        };

        self.persist(subscriber_id, previous, &rule).await?;
        Ok((rule, created))
    }

    async fn set_enabled(
        &self,
        subscriber_id: SubscriberId,
        enabled: bool,
    ) -> Result<Option<ReminderRule>, SubscriptionError> {
        let _guard = self.writer.lock().await;
        let previous = self.scheduler.snapshot(subscriber_id);
        let updated = if enabled {
            self.scheduler.enable(subscriber_id)
        } else {
            self.scheduler.disable(subscriber_id)
        };

        match updated {
            Some(rule) => {
                self.persist(subscriber_id, previous, &rule).await?;
                Ok(Some(rule))
            }
            None => Ok(None),
        }
    }

    /// Returns whether a rule existed. Deleting twice is fine.
    pub async fn delete(&self, subscriber_id: SubscriberId) -> Result<bool, SubscriptionError> {
        let _guard = self.writer.lock().await;
        let previous = self.scheduler.snapshot(subscriber_id);
        let removed = self.scheduler.delete(subscriber_id);

        if let Err(e) = self.store.delete(subscriber_id).await {
            warn!("Rolling back delete for {}: {}", subscriber_id, e);
            self.scheduler.reinstate(subscriber_id, previous);
            return Err(e.into());
        }
        Ok(removed.is_some())
    }

    async fn persist(
        &self,
        subscriber_id: SubscriberId,
        previous: SubscriberSnapshot,
        rule: &ReminderRule,
    ) -> Result<(), SubscriptionError> {
        if let Err(e) = self.store.put(rule).await {
            warn!("Rolling back reminder change for {}: {}", subscriber_id, e);
            self.scheduler.reinstate(subscriber_id, previous);
            return Err(e.into());
        }
        Ok(())
    }
}
