use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use teloxide::{prelude::*, Bot};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::services::countdown::CountdownEngine;
use crate::services::scheduler::{DueFiring, ReminderScheduler, SubscriberId};
use crate::utils::logging::log_reminder_dispatch;

/// Every minute, on the minute
const TICK_SCHEDULE: &str = "0 * * * * *";

/// Delivers rendered reminders to a subscriber
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subscriber_id: SubscriberId, text: &str) -> anyhow::Result<()>;
}

/// Sends reminders as Telegram messages
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, subscriber_id: SubscriberId, text: &str) -> anyhow::Result<()> {
        self.bot
            .send_message(ChatId(subscriber_id), text.to_string())
            .await?;
        Ok(())
    }
}

/// What happened during one tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Exam keys that no longer exist in the catalog
    pub skipped_exams: usize,
}

pub struct ReminderService {
    scheduler: Arc<ReminderScheduler>,
    engine: CountdownEngine,
    notifier: Arc<dyn Notifier>,
    jobs: JobScheduler,
}

impl ReminderService {
    pub async fn new(
        scheduler: Arc<ReminderScheduler>,
        engine: CountdownEngine,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let jobs = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            engine,
            notifier,
            jobs,
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = self.scheduler.clone();
        let engine = self.engine.clone();
        let notifier = self.notifier.clone();

        let tick_job = Job::new_async(TICK_SCHEDULE, move |_uuid, _l| {
            let scheduler = scheduler.clone();
            let engine = engine.clone();
            let notifier = notifier.clone();
            Box::pin(async move {
                let report =
                    deliver_due_reminders(&scheduler, &engine, notifier.as_ref(), Utc::now()).await;
                if report.due > 0 {
                    tracing::info!(
                        "Reminder tick: {} due, {} delivered, {} failed",
                        report.due,
                        report.delivered,
                        report.failed
                    );
                }
            })
        })?;

        self.jobs.add(tick_job).await?;
        self.jobs.start().await?;

        tracing::info!(
            "Reminder service started - checking every minute in {}",
            self.scheduler.zone().name()
        );
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.jobs.shutdown().await?;
        Ok(())
    }

    // Manual trigger for testing
    pub async fn check_reminders_now(&self) -> TickReport {
        deliver_due_reminders(
            &self.scheduler,
            &self.engine,
            self.notifier.as_ref(),
            Utc::now(),
        )
        .await
    }
}

/// Message text for one firing, or `None` when none of its exams exist
/// any more. The second value counts the exams that were skipped.
pub fn render_firing(
    engine: &CountdownEngine,
    firing: &DueFiring,
    now: DateTime<Utc>,
) -> (Option<String>, usize) {
    let mut lines = Vec::new();
    let mut skipped = 0;

    for key in &firing.exams {
        match engine.render_by_key(key, now) {
            Ok(text) => lines.push(text),
            Err(e) => {
                tracing::warn!(
                    "Skipping exam '{}' in reminder for {}: {}",
                    key,
                    firing.subscriber_id,
                    e
                );
                skipped += 1;
            }
        }
    }

    if lines.is_empty() {
        return (None, skipped);
    }
    (
        Some(format!("🔔 Daily konkur reminder\n\n{}", lines.join("\n"))),
        skipped,
    )
}

/// Runs one tick: asks the scheduler what is due and delivers each firing
/// on its own, so a failure for one subscriber never stops the others.
pub async fn deliver_due_reminders(
    scheduler: &ReminderScheduler,
    engine: &CountdownEngine,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> TickReport {
    let firings = scheduler.tick(now);
    let mut report = TickReport {
        due: firings.len(),
        ..TickReport::default()
    };

    for firing in &firings {
        let exams = firing
            .exams
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(",");

        let (text, skipped) = render_firing(engine, firing, now);
        report.skipped_exams += skipped;

        let Some(text) = text else {
            report.failed += 1;
            log_reminder_dispatch(firing.subscriber_id, &exams, Err("no known exams to report"));
            continue;
        };

        match notifier.notify(firing.subscriber_id, &text).await {
            Ok(()) => {
                report.delivered += 1;
                log_reminder_dispatch(firing.subscriber_id, &exams, Ok(()));
            }
            Err(e) => {
                report.failed += 1;
                log_reminder_dispatch(firing.subscriber_id, &exams, Err(&e.to_string()));
            }
        }
    }

    report
}
