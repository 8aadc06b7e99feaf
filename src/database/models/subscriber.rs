use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::services::scheduler::SubscriberId;

/// Exam reported by a bare "time left" request until the user picks one
pub const DEFAULT_PREFERRED_EXAM: &str = "exp";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subscriber {
    pub subscriber_id: i64,
    pub preferred_exam: String,
    pub created_at: String,
}

impl Subscriber {
    pub async fn find(
        pool: &sqlx::SqlitePool,
        subscriber_id: SubscriberId,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscriber>(
            "SELECT subscriber_id, preferred_exam, created_at FROM subscribers WHERE subscriber_id = ?"
        )
        .bind(subscriber_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn get_or_create(
        pool: &sqlx::SqlitePool,
        subscriber_id: SubscriberId,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT OR IGNORE INTO subscribers (subscriber_id, preferred_exam, created_at) VALUES (?, ?, ?)"
        )
        .bind(subscriber_id)
        .bind(DEFAULT_PREFERRED_EXAM)
        .bind(&now)
        .execute(pool)
        .await?;

        Self::find(pool, subscriber_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn set_preferred_exam(
        pool: &sqlx::SqlitePool,
        subscriber_id: SubscriberId,
        exam_key: &str,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO subscribers (subscriber_id, preferred_exam, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(subscriber_id) DO UPDATE SET preferred_exam = excluded.preferred_exam
            "#,
        )
        .bind(subscriber_id)
        .bind(exam_key)
        .bind(&now)
        .execute(pool)
        .await?;

        Self::find(pool, subscriber_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Deletes the subscriber row and study log in one transaction.
    /// Returns the number of rows removed. Reminder rules are not touched;
    /// they only change through `SubscriptionService`.
    pub async fn purge(
        pool: &sqlx::SqlitePool,
        subscriber_id: SubscriberId,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut removed = 0;

        for table in ["study_entries", "subscribers"] {
            let query = format!("DELETE FROM {table} WHERE subscriber_id = ?");
            removed += sqlx::query(&query)
                .bind(subscriber_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        Ok(removed)
    }
}
