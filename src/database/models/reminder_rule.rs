use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::services::scheduler::{ReminderError, ReminderRule, SubscriberId};

/// Row shape of `reminder_rules`
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReminderRuleRecord {
    pub subscriber_id: i64,
    pub exams: String, // comma-separated exam keys
    pub time_of_day: String, // HH:MM
    pub recurrence: String, // 'daily' or 'mon,tue,...'
    pub enabled: bool,
    pub updated_at: String,
}

impl From<&ReminderRule> for ReminderRuleRecord {
    fn from(rule: &ReminderRule) -> Self {
        Self {
            subscriber_id: rule.subscriber_id,
            exams: rule.exams.iter().cloned().collect::<Vec<_>>().join(","),
            time_of_day: rule.time_of_day.to_string(),
            recurrence: rule.recurrence.to_string(),
            enabled: rule.enabled,
            updated_at: Utc::now().to_rfc3339(),
        }
    }
}

impl TryFrom<ReminderRuleRecord> for ReminderRule {
    type Error = ReminderError;

    fn try_from(record: ReminderRuleRecord) -> Result<Self, Self::Error> {
        let exams = record
            .exams
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect::<std::collections::BTreeSet<_>>();
        if exams.is_empty() {
            return Err(ReminderError::EmptyExamSet);
        }

        Ok(ReminderRule {
            subscriber_id: record.subscriber_id,
            exams,
            time_of_day: record.time_of_day.parse()?,
            recurrence: record.recurrence.parse()?,
            enabled: record.enabled,
        })
    }
}

impl ReminderRuleRecord {
    /// Inserts or replaces the subscriber's single rule
    pub async fn upsert(pool: &sqlx::SqlitePool, record: &Self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO reminder_rules (subscriber_id, exams, time_of_day, recurrence, enabled, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(subscriber_id) DO UPDATE SET
                exams = excluded.exams,
                time_of_day = excluded.time_of_day,
                recurrence = excluded.recurrence,
                enabled = excluded.enabled,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.subscriber_id)
        .bind(&record.exams)
        .bind(&record.time_of_day)
        .bind(&record.recurrence)
        .bind(record.enabled)
        .bind(&record.updated_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_subscriber(
        pool: &sqlx::SqlitePool,
        subscriber_id: SubscriberId,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ReminderRuleRecord>(
            "SELECT subscriber_id, exams, time_of_day, recurrence, enabled, updated_at FROM reminder_rules WHERE subscriber_id = ?"
        )
        .bind(subscriber_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ReminderRuleRecord>(
            "SELECT subscriber_id, exams, time_of_day, recurrence, enabled, updated_at FROM reminder_rules ORDER BY subscriber_id"
        )
        .fetch_all(pool)
        .await
    }

    /// Returns whether a row was removed
    pub async fn delete(
        pool: &sqlx::SqlitePool,
        subscriber_id: SubscriberId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reminder_rules WHERE subscriber_id = ?")
            .bind(subscriber_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
