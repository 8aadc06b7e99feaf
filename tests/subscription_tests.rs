#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use konkur_countdown_bot::database::store::{InMemoryRuleStore, RuleStore, StoreError};
use konkur_countdown_bot::exams::ExamCatalog;
use konkur_countdown_bot::services::scheduler::{
    Recurrence, ReminderError, ReminderRule, ReminderScheduler, SubscriberId, TimeOfDay,
    DEFAULT_REMINDER_TIME,
};
use konkur_countdown_bot::services::subscription::{SubscriptionError, SubscriptionService};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

/// Wraps the in-memory store and fails every write while `broken` is set
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryRuleStore,
    broken: AtomicBool,
}

impl FlakyStore {
    fn check(&self) -> Result<(), StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl RuleStore for FlakyStore {
    async fn get(&self, subscriber_id: SubscriberId) -> Result<Option<ReminderRule>, StoreError> {
        self.inner.get(subscriber_id).await
    }

    async fn put(&self, rule: &ReminderRule) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put(rule).await
    }

    async fn delete(&self, subscriber_id: SubscriberId) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.delete(subscriber_id).await
    }

    async fn all(&self) -> Result<Vec<ReminderRule>, StoreError> {
        self.inner.all().await
    }
}

fn service(store: Arc<dyn RuleStore>) -> SubscriptionService {
    let catalog = Arc::new(ExamCatalog::konkur_1405().unwrap());
    let scheduler = Arc::new(ReminderScheduler::new(chrono_tz::Asia::Tehran, catalog));
    SubscriptionService::new(scheduler, store)
}

fn eight() -> TimeOfDay {
    TimeOfDay::new(8, 0).unwrap()
}

#[tokio::test]
async fn test_upsert_persists_rule() {
    let store = Arc::new(InMemoryRuleStore::new());
    let subscriptions = service(store.clone());

    let rule = subscriptions
        .upsert(42, vec!["math".to_string()], eight(), Recurrence::EveryDay)
        .await
        .unwrap();

    assert_eq!(store.get(42).await.unwrap(), Some(rule.clone()));
    assert_eq!(subscriptions.get(42), Some(rule));
}

#[tokio::test]
async fn test_invalid_rule_is_not_persisted() {
    let store = Arc::new(InMemoryRuleStore::new());
    let subscriptions = service(store.clone());

    let err = subscriptions
        .upsert(42, vec!["chemistry".to_string()], eight(), Recurrence::EveryDay)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SubscriptionError::Rule(ReminderError::UnknownExam(ref key)) if key == "chemistry"
    ));
    assert!(store.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_write_rolls_back_upsert() {
    let store = Arc::new(FlakyStore::default());
    let subscriptions = service(store.clone());

    let original = subscriptions
        .upsert(42, vec!["math".to_string()], eight(), Recurrence::EveryDay)
        .await
        .unwrap();

    store.broken.store(true, Ordering::SeqCst);
    let result = subscriptions
        .upsert(
            42,
            vec!["exp".to_string()],
            TimeOfDay::new(21, 0).unwrap(),
            Recurrence::EveryDay,
        )
        .await;

    assert!(matches!(result, Err(SubscriptionError::Store(_))));
    assert_eq!(subscriptions.get(42), Some(original));
}

#[tokio::test]
async fn test_failed_write_rolls_back_new_rule() {
    let store = Arc::new(FlakyStore::default());
    store.broken.store(true, Ordering::SeqCst);
    let subscriptions = service(store.clone());

    assert!(subscriptions
        .upsert(42, vec!["math".to_string()], eight(), Recurrence::EveryDay)
        .await
        .is_err());
    assert!(subscriptions.get(42).is_none());
}

#[tokio::test]
async fn test_failed_disable_and_delete_roll_back() {
    let store = Arc::new(FlakyStore::default());
    let subscriptions = service(store.clone());
    let original = subscriptions
        .upsert(42, vec!["math".to_string()], eight(), Recurrence::EveryDay)
        .await
        .unwrap();

    store.broken.store(true, Ordering::SeqCst);
    assert!(subscriptions.disable(42).await.is_err());
    assert_eq!(subscriptions.get(42), Some(original.clone()));

    assert!(subscriptions.delete(42).await.is_err());
    assert_eq!(subscriptions.get(42), Some(original));
}

#[tokio::test]
async fn test_rolled_back_write_keeps_minute_fired() {
    let store = Arc::new(FlakyStore::default());
    let subscriptions = service(store.clone());
    // 08:00 in Tehran
    let eight_local = Utc.with_ymd_and_hms(2026, 6, 1, 4, 30, 0).unwrap();

    subscriptions
        .upsert(42, vec!["math".to_string()], eight(), Recurrence::EveryDay)
        .await
        .unwrap();
    assert_eq!(subscriptions.scheduler().tick(eight_local).len(), 1);

    store.broken.store(true, Ordering::SeqCst);
    assert_err!(
        subscriptions
            .upsert(42, vec!["exp".to_string()], eight(), Recurrence::EveryDay)
            .await
    );
    assert!(subscriptions
        .scheduler()
        .tick(eight_local + Duration::seconds(20))
        .is_empty());

    assert_err!(subscriptions.delete(42).await);
    assert!(subscriptions
        .scheduler()
        .tick(eight_local + Duration::seconds(40))
        .is_empty());

    // The next day still fires
    assert_eq!(
        subscriptions
            .scheduler()
            .tick(eight_local + Duration::days(1))
            .len(),
        1
    );
}

#[tokio::test]
async fn test_enable_or_create_makes_default_daily_rule() {
    let store = Arc::new(InMemoryRuleStore::new());
    let subscriptions = service(store.clone());

    let (rule, created) = assert_ok!(subscriptions.enable_or_create(42, "exp".to_string()).await);
    assert!(created);
    assert!(rule.enabled);
    assert_eq!(rule.time_of_day, DEFAULT_REMINDER_TIME);
    assert_eq!(DEFAULT_REMINDER_TIME, TimeOfDay::new(8, 0).unwrap());
    assert_eq!(rule.recurrence, Recurrence::EveryDay);
    assert!(rule.exams.contains("exp"));
    assert_eq!(store.get(42).await.unwrap(), Some(rule));
}

#[tokio::test]
async fn test_enable_or_create_keeps_existing_rule() {
    let store = Arc::new(InMemoryRuleStore::new());
    let subscriptions = service(store.clone());
    let nine_pm = TimeOfDay::new(21, 0).unwrap();

    subscriptions
        .upsert(42, vec!["math".to_string()], nine_pm, Recurrence::EveryDay)
        .await
        .unwrap();
    subscriptions.disable(42).await.unwrap();

    let (rule, created) = assert_ok!(subscriptions.enable_or_create(42, "exp".to_string()).await);
    assert!(!created);
    assert!(rule.enabled);
    assert_eq!(rule.time_of_day, nine_pm);
    assert!(rule.exams.contains("math"));
    assert!(!rule.exams.contains("exp"));
}

#[tokio::test]
async fn test_enable_or_create_rejects_retired_exam() {
    let store = Arc::new(FlakyStore::default());
    let subscriptions = service(store.clone());

    let err = assert_err!(
        subscriptions
            .enable_or_create(42, "chemistry".to_string())
            .await
    );
    assert!(matches!(err, SubscriptionError::Rule(ReminderError::UnknownExam(_))));
    assert!(subscriptions.get(42).is_none());

    store.broken.store(true, Ordering::SeqCst);
    assert_err!(subscriptions.enable_or_create(42, "exp".to_string()).await);
    assert!(subscriptions.get(42).is_none());
    assert!(store.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_disable_enable_and_delete() {
    let store = Arc::new(InMemoryRuleStore::new());
    let subscriptions = service(store.clone());

    assert_eq!(subscriptions.disable(42).await.unwrap(), None);

    subscriptions
        .upsert(42, vec!["math".to_string()], eight(), Recurrence::EveryDay)
        .await
        .unwrap();

    let disabled = subscriptions.disable(42).await.unwrap().unwrap();
    assert!(!disabled.enabled);
    assert!(!store.get(42).await.unwrap().unwrap().enabled);

    let enabled = subscriptions.enable(42).await.unwrap().unwrap();
    assert!(enabled.enabled);

    assert!(subscriptions.delete(42).await.unwrap());
    assert!(!subscriptions.delete(42).await.unwrap());
    assert!(store.get(42).await.unwrap().is_none());
}

#[tokio::test]
async fn test_restore_loads_persisted_rules() {
    let store = Arc::new(InMemoryRuleStore::new());
    let first = service(store.clone());
    first
        .upsert(1, vec!["math".to_string()], eight(), Recurrence::EveryDay)
        .await
        .unwrap();
    first
        .upsert(2, vec!["art".to_string()], eight(), Recurrence::EveryDay)
        .await
        .unwrap();
    first.disable(2).await.unwrap();

    // A fresh process
    let second = service(store);
    assert_eq!(second.restore().await.unwrap(), 2);
    assert_eq!(second.scheduler().enabled_count(), 1);
    assert_eq!(second.get(2).map(|r| r.enabled), Some(false));
}

#[tokio::test]
async fn test_concurrent_upserts_keep_store_and_scheduler_in_step() {
    let store = Arc::new(InMemoryRuleStore::new());
    let subscriptions = Arc::new(service(store.clone()));

    let mut handles = Vec::new();
    for hour in 0..20u32 {
        let subscriptions = subscriptions.clone();
        handles.push(tokio::spawn(async move {
            subscriptions
                .upsert(
                    42,
                    vec!["math".to_string()],
                    TimeOfDay::new(hour, 0).unwrap(),
                    Recurrence::EveryDay,
                )
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.get(42).await.unwrap(), subscriptions.get(42));
}
