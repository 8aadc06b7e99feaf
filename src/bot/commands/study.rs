use teloxide::prelude::*;

use crate::bot::keyboards::study_entries;
use crate::bot::AppContext;
use crate::database::models::{total_hours, StudyEntry};
use crate::utils::feedback::CommandFeedback;
use crate::utils::logging::{log_command_error, log_command_success, log_validation_error};
use crate::utils::validation::{parse_entry_number, parse_study_entry};

const STUDY_FORMAT_HINT: &str = "Send: subject, start, end, hours\ne.g. Physics, 14:00, 16:00, 2";

pub async fn handle_study(bot: Bot, msg: Message, entry: String, ctx: &AppContext) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let feedback = CommandFeedback::new(bot, chat_id);

    if entry.is_empty() {
        feedback.info(STUDY_FORMAT_HINT).await?;
        return Ok(());
    }

    let input = match parse_study_entry(&entry) {
        Ok(input) => input,
        Err(e) => {
            log_validation_error("study", &entry, &e.to_string(), chat_id.0);
            feedback.validation_error(&e.to_string(), STUDY_FORMAT_HINT).await?;
            return Ok(());
        }
    };

    match StudyEntry::create(
        &ctx.db.pool,
        chat_id.0,
        input.subject,
        input.start.to_string(),
        input.end.to_string(),
        input.hours,
    )
    .await
    {
        Ok(saved) => {
            log_command_success("study", chat_id.0, Some(&saved.subject));
            feedback
                .success(&format!(
                    "Logged {} hours of {} ({} to {})",
                    saved.hours, saved.subject, saved.start_time, saved.end_time
                ))
                .await?;
        }
        Err(e) => {
            log_command_error("study", chat_id.0, &e.to_string());
            feedback.error("Could not save your study time. Please try again later.").await?;
        }
    }
    Ok(())
}

/// Numbered list of entries with the running total
pub fn format_progress(entries: &[StudyEntry]) -> String {
    let mut text = String::from("📊 Your study log:\n\n");
    for (i, entry) in entries.iter().enumerate() {
        text.push_str(&format!(
            "{}. {}: {} to {} ({} h)\n",
            i + 1,
            entry.subject,
            entry.start_time,
            entry.end_time,
            entry.hours
        ));
    }
    text.push_str(&format!("\nTotal: {} hours", total_hours(entries)));
    text
}

pub async fn handle_progress(bot: Bot, msg: Message, ctx: &AppContext) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let feedback = CommandFeedback::new(bot, chat_id);

    match StudyEntry::find_by_subscriber(&ctx.db.pool, chat_id.0).await {
        Ok(entries) if entries.is_empty() => {
            feedback.info(&format!("Nothing logged yet.\n{STUDY_FORMAT_HINT}")).await?;
        }
        Ok(entries) => {
            feedback
                .plain(format_progress(&entries), Some(study_entries(&entries).into()))
                .await?;
            log_command_success("progress", chat_id.0, Some(&format!("{} entries", entries.len())));
        }
        Err(e) => {
            log_command_error("progress", chat_id.0, &e.to_string());
            feedback.error("Could not load your study log. Please try again later.").await?;
        }
    }
    Ok(())
}

pub async fn handle_unstudy(bot: Bot, msg: Message, number: String, ctx: &AppContext) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let feedback = CommandFeedback::new(bot, chat_id);

    let entries = match StudyEntry::find_by_subscriber(&ctx.db.pool, chat_id.0).await {
        Ok(entries) => entries,
        Err(e) => {
            log_command_error("unstudy", chat_id.0, &e.to_string());
            feedback.error("Could not load your study log. Please try again later.").await?;
            return Ok(());
        }
    };

    let index = match parse_entry_number(&number, entries.len()) {
        Ok(n) => n - 1,
        Err(e) => {
            log_validation_error("unstudy", &number, &e.to_string(), chat_id.0);
            feedback
                .validation_error(&e.to_string(), "Use /progress to see the numbered list")
                .await?;
            return Ok(());
        }
    };

    let text = delete_study_entry(ctx, chat_id, &entries[index].id).await;
    feedback.plain(text, None).await?;
    Ok(())
}

/// Deletes one of the subscriber's entries and returns the reply text
pub async fn delete_study_entry(ctx: &AppContext, chat_id: ChatId, id: &str) -> String {
    match StudyEntry::delete(&ctx.db.pool, chat_id.0, id).await {
        Ok(true) => {
            log_command_success("unstudy", chat_id.0, Some(id));
            "🗑️ Entry deleted.".to_string()
        }
        Ok(false) => "That entry no longer exists.".to_string(),
        Err(e) => {
            log_command_error("unstudy", chat_id.0, &e.to_string());
            "❌ Could not delete the entry. Please try again later.".to_string()
        }
    }
}
