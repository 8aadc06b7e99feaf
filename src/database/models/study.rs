use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::services::scheduler::SubscriberId;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StudyEntry {
    pub id: String,
    pub subscriber_id: i64,
    pub subject: String,
    pub start_time: String, // HH:MM
    pub end_time: String,   // HH:MM
    pub hours: f64,
    pub created_at: String,
}

impl StudyEntry {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        subscriber_id: SubscriberId,
        subject: String,
        start_time: String,
        end_time: String,
        hours: f64,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO study_entries (id, subscriber_id, subject, start_time, end_time, hours, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(subscriber_id)
        .bind(&subject)
        .bind(&start_time)
        .bind(&end_time)
        .bind(hours)
        .bind(&created_at)
        .execute(pool)
        .await?;

        Ok(StudyEntry {
            id,
            subscriber_id,
            subject,
            start_time,
            end_time,
            hours,
            created_at,
        })
    }

    /// Entries in the order they were logged
    pub async fn find_by_subscriber(
        pool: &sqlx::SqlitePool,
        subscriber_id: SubscriberId,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, StudyEntry>(
            "SELECT id, subscriber_id, subject, start_time, end_time, hours, created_at FROM study_entries WHERE subscriber_id = ? ORDER BY created_at, rowid"
        )
        .bind(subscriber_id)
        .fetch_all(pool)
        .await
    }

    /// Scoped to the owner so one subscriber cannot delete another's entry
    pub async fn delete(
        pool: &sqlx::SqlitePool,
        subscriber_id: SubscriberId,
        id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM study_entries WHERE id = ? AND subscriber_id = ?")
            .bind(id)
            .bind(subscriber_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Sum of logged hours
pub fn total_hours(entries: &[StudyEntry]) -> f64 {
    entries.iter().map(|e| e.hours).sum()
}
