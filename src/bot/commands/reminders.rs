use chrono::Utc;
use teloxide::prelude::*;

use crate::bot::commands::countdown::preferred_exam;
use crate::bot::intent::BUTTON_REMINDER_TIME;
use crate::bot::AppContext;
use crate::database::models::Subscriber;
use crate::exams::ExamCatalog;
use crate::services::scheduler::{Recurrence, ReminderRule};
use crate::services::subscription::SubscriptionError;
use crate::utils::datetime::format_datetime;
use crate::utils::feedback::CommandFeedback;
use crate::utils::logging::{log_command_error, log_command_success, log_validation_error};
use crate::utils::validation::{parse_reminder_request, validate_telegram_chat_id};

const REMINDER_TIME_PROMPT: &str = "Send the time for your daily reminder, e.g. 20:00 or ۲۰:۳۰.\n\
For other days or exams use /remind 7:30 math,exp weekdays";

/// Human readable summary of a rule
pub fn describe_rule(rule: &ReminderRule, catalog: &ExamCatalog) -> String {
    let exams: Vec<&str> = rule
        .exams
        .iter()
        .map(|key| catalog.find(key).map_or(key.as_str(), |e| e.name()))
        .collect();
    let days = match &rule.recurrence {
        Recurrence::EveryDay => "every day".to_string(),
        other => format!("on {other}"),
    };
    let status = if rule.enabled { "on" } else { "paused" };

    format!(
        "⏰ Reminder at {} {} for {} ({})",
        rule.time_of_day,
        days,
        exams.join(", "),
        status
    )
}

pub async fn handle_remind(bot: Bot, msg: Message, args: String, ctx: &AppContext) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let feedback = CommandFeedback::new(bot, chat_id);
    let catalog = ctx.engine.catalog();

    if args.trim().is_empty() {
        feedback.info(REMINDER_TIME_PROMPT).await?;
        return Ok(());
    }

    if let Err(e) = validate_telegram_chat_id(chat_id.0) {
        log_validation_error("remind", &chat_id.0.to_string(), &e.to_string(), chat_id.0);
        feedback.error("Reminders cannot be set up for this chat.").await?;
        return Ok(());
    }

    let request = match parse_reminder_request(&args, catalog) {
        Ok(request) => request,
        Err(e) => {
            log_validation_error("remind", &args, &e.to_string(), chat_id.0);
            feedback
                .validation_error(
                    &e.to_string(),
                    "Try /remind 20:00 math,exp or /remind 7:30 all weekdays",
                )
                .await?;
            return Ok(());
        }
    };

    let exams = match request.exams {
        Some(exams) => exams,
        None => match preferred_exam(ctx, chat_id).await {
            Ok(key) => vec![key],
            Err(e) => {
                log_command_error("remind", chat_id.0, &e.to_string());
                feedback.error("Could not load your settings. Please try again later.").await?;
                return Ok(());
            }
        },
    };

    match ctx
        .subscriptions
        .upsert(chat_id.0, exams, request.time_of_day, request.recurrence)
        .await
    {
        Ok(rule) => {
            log_command_success("remind", chat_id.0, Some(&rule.time_of_day.to_string()));
            feedback
                .success(&format!("Saved. {}", describe_rule(&rule, catalog)))
                .await?;
        }
        Err(SubscriptionError::Rule(e)) => {
            log_validation_error("remind", &args, &e.to_string(), chat_id.0);
            feedback
                .validation_error(&e.to_string(), "Use /choose to pick one of the current exams.")
                .await?;
        }
        Err(e) => {
            log_command_error("remind", chat_id.0, &e.to_string());
            feedback.error("Could not save your reminder. Please try again later.").await?;
        }
    }
    Ok(())
}

/// Switches the reminder on, creating a daily 08:00 one for the preferred
/// exam when the chat has none yet
pub async fn handle_remind_on(bot: Bot, msg: Message, ctx: &AppContext) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let feedback = CommandFeedback::new(bot, chat_id);

    let exam = match preferred_exam(ctx, chat_id).await {
        Ok(key) => key,
        Err(e) => {
            log_command_error("remind_on", chat_id.0, &e.to_string());
            feedback.error("Could not load your settings. Please try again later.").await?;
            return Ok(());
        }
    };

    match ctx.subscriptions.enable_or_create(chat_id.0, exam).await {
        Ok((rule, created)) => {
            log_command_success("remind_on", chat_id.0, created.then_some("created"));
            let lead = if created {
                "Daily reminder created."
            } else {
                "Reminder is back on."
            };
            let text = format!(
                "{lead} {}\nChange the time with {}",
                describe_rule(&rule, ctx.engine.catalog()),
                BUTTON_REMINDER_TIME
            );
            feedback.success(&text).await?;
        }
        Err(SubscriptionError::Rule(e)) => {
            log_validation_error("remind_on", "", &e.to_string(), chat_id.0);
            feedback
                .validation_error(&e.to_string(), "Use /choose to pick one of the current exams.")
                .await?;
        }
        Err(e) => {
            log_command_error("remind_on", chat_id.0, &e.to_string());
            feedback.error("Could not update your reminder. Please try again later.").await?;
        }
    }
    Ok(())
}

pub async fn handle_remind_off(bot: Bot, msg: Message, ctx: &AppContext) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let feedback = CommandFeedback::new(bot, chat_id);

    match ctx.subscriptions.disable(chat_id.0).await {
        Ok(Some(_)) => {
            log_command_success("remind_off", chat_id.0, None);
            feedback
                .success("Reminder paused. Use /remind_on to resume it.")
                .await?;
        }
        Ok(None) => {
            feedback.warning("You have no reminder to pause.").await?;
        }
        Err(e) => {
            log_command_error("remind_off", chat_id.0, &e.to_string());
            feedback.error("Could not update your reminder. Please try again later.").await?;
        }
    }
    Ok(())
}

pub async fn handle_reminder_status(bot: Bot, msg: Message, ctx: &AppContext) -> ResponseResult<()> {
    let feedback = CommandFeedback::new(bot, msg.chat.id);
    match ctx.subscriptions.get(msg.chat.id.0) {
        Some(rule) => {
            let zone = ctx.subscriptions.scheduler().zone();
            let text = format!(
                "{}\nTimes are in {}, where it is now {}",
                describe_rule(&rule, ctx.engine.catalog()),
                zone.name(),
                format_datetime(&Utc::now(), zone)
            );
            feedback.info(&text).await?;
        }
        None => {
            feedback
                .info("You have no reminder yet. Set one with /remind 20:00")
                .await?;
        }
    }
    Ok(())
}

/// Drops the reminder first so nothing fires while the rows are purged
pub async fn handle_forget(bot: Bot, msg: Message, ctx: &AppContext) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let feedback = CommandFeedback::new(bot, chat_id);

    if let Err(e) = ctx.subscriptions.delete(chat_id.0).await {
        log_command_error("forget", chat_id.0, &e.to_string());
        feedback.error("Could not delete your data. Please try again later.").await?;
        return Ok(());
    }

    match Subscriber::purge(&ctx.db.pool, chat_id.0).await {
        Ok(removed) => {
            log_command_success("forget", chat_id.0, Some(&format!("{removed} rows")));
            feedback.success("All your data has been deleted.").await?;
        }
        Err(e) => {
            log_command_error("forget", chat_id.0, &e.to_string());
            feedback.error("Could not delete your data. Please try again later.").await?;
        }
    }
    Ok(())
}
