use chrono::Utc;
use teloxide::prelude::*;

use crate::bot::keyboards::{exam_picker, CALLBACK_CHOOSE, CALLBACK_COUNTDOWN};
use crate::bot::AppContext;
use crate::database::models::Subscriber;
use crate::services::countdown::CountdownEngine;
use crate::utils::feedback::CommandFeedback;
use crate::utils::logging::{log_command_error, log_command_success};

/// The subscriber's preferred exam key, creating their profile on first use
pub async fn preferred_exam(ctx: &AppContext, chat_id: ChatId) -> Result<String, sqlx::Error> {
    Subscriber::get_or_create(&ctx.db.pool, chat_id.0)
        .await
        .map(|s| s.preferred_exam)
}

pub async fn handle_exams(bot: Bot, msg: Message, ctx: &AppContext) -> ResponseResult<()> {
    let catalog = ctx.engine.catalog();
    let mut text = String::from("📅 Exam dates (Tehran time):\n\n");
    for event in catalog.events() {
        let dates: Vec<String> = event.targets().iter().map(|t| t.civil.to_string()).collect();
        text.push_str(&format!(
            "• {} ({}): {}\n",
            event.name(),
            event.key(),
            dates.join(" and ")
        ));
    }
    text.push_str("\nTap an exam to see how long is left.");

    CommandFeedback::new(bot, msg.chat.id)
        .plain(text, Some(exam_picker(catalog, CALLBACK_COUNTDOWN).into()))
        .await?;
    Ok(())
}

pub async fn handle_left(
    bot: Bot,
    msg: Message,
    exam: Option<String>,
    ctx: &AppContext,
) -> ResponseResult<()> {
    let feedback = CommandFeedback::new(bot, msg.chat.id);
    let catalog = ctx.engine.catalog();

    let key = match exam {
        Some(query) => match catalog.resolve(&query) {
            Some(event) => event.key().to_string(),
            None => {
                let suggestion = format!("Valid exams: {}", catalog.keys().join(", "));
                feedback
                    .validation_error(&format!("Unknown exam '{query}'"), &suggestion)
                    .await?;
                return Ok(());
            }
        },
        None => match preferred_exam(ctx, msg.chat.id).await {
            Ok(key) => key,
            Err(e) => {
                log_command_error("left", msg.chat.id.0, &e.to_string());
                feedback.error("Could not load your settings. Please try again later.").await?;
                return Ok(());
            }
        },
    };

    match ctx.engine.render_by_key(&key, Utc::now()) {
        Ok(text) => {
            feedback.plain(text, None).await?;
            log_command_success("left", msg.chat.id.0, Some(&key));
        }
        Err(e) => {
            tracing::warn!("Countdown for '{}' failed: {}", key, e);
            feedback
                .validation_error(
                    "Your chosen exam is no longer on the schedule",
                    "Use /choose to pick one of the current exams.",
                )
                .await?;
        }
    }
    Ok(())
}

pub async fn handle_choose(
    bot: Bot,
    msg: Message,
    exam: Option<String>,
    ctx: &AppContext,
) -> ResponseResult<()> {
    let feedback = CommandFeedback::new(bot, msg.chat.id);
    let catalog = ctx.engine.catalog();

    let Some(query) = exam else {
        feedback
            .plain(
                "🎯 Which exam are you taking?",
                Some(exam_picker(catalog, CALLBACK_CHOOSE).into()),
            )
            .await?;
        return Ok(());
    };

    let Some(event) = catalog.resolve(&query) else {
        let suggestion = format!("Valid exams: {}", catalog.keys().join(", "));
        feedback
            .validation_error(&format!("Unknown exam '{query}'"), &suggestion)
            .await?;
        return Ok(());
    };

    match choose_exam(ctx, msg.chat.id, event.key()).await {
        Ok(text) => {
            feedback.plain(text, None).await?;
        }
        Err(e) => {
            log_command_error("choose", msg.chat.id.0, &e.to_string());
            feedback.error("Could not save your choice. Please try again later.").await?;
        }
    }
    Ok(())
}

/// Saves the preferred exam and returns the confirmation with its countdown
pub async fn choose_exam(
    ctx: &AppContext,
    chat_id: ChatId,
    key: &str,
) -> Result<String, sqlx::Error> {
    Subscriber::set_preferred_exam(&ctx.db.pool, chat_id.0, key).await?;
    log_command_success("choose", chat_id.0, Some(key));

    let event = ctx.engine.catalog().find(key);
    let name = event.map_or(key, |e| e.name());
    let countdown = event
        .map(|e| crate::services::countdown::render(&CountdownEngine::compute(e, Utc::now())))
        .unwrap_or_default();

    Ok(format!("✅ {name} saved as your exam.\n\n{countdown}"))
}
