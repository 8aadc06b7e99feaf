use chrono::Utc;
use teloxide::prelude::*;

use crate::bot::commands::countdown::choose_exam;
use crate::bot::commands::study::delete_study_entry;
use crate::bot::keyboards::{
    exam_picker, parse_callback, CALLBACK_CHOOSE, CALLBACK_COUNTDOWN, CALLBACK_STUDY_DELETE,
};
use crate::bot::handlers::HandlerResult;
use crate::bot::AppContext;
use crate::utils::logging::log_command_error;

pub async fn callback_handler(bot: Bot, q: CallbackQuery, ctx: AppContext) -> HandlerResult {
    let username = q.from.username.as_deref().unwrap_or("unknown");
    let Some(message) = q.message.as_ref() else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    let chat_id = message.chat.id;
    let data = q.data.as_deref().unwrap_or_default();

    tracing::info!(
        "Callback received: '{}' from user {} ({}) in chat {}",
        data,
        username,
        q.from.id.0,
        chat_id.0
    );

    let Some((action, arg)) = parse_callback(data) else {
        bot.answer_callback_query(q.id.clone())
            .text("Invalid button")
            .await?;
        return Ok(());
    };

    match action {
        CALLBACK_COUNTDOWN => {
            let catalog = ctx.engine.catalog();
            match ctx.engine.render_by_key(arg, Utc::now()) {
                Ok(text) => {
                    // Editing to identical text is rejected by Telegram; not worth surfacing
                    if let Err(e) = bot
                        .edit_message_text(chat_id, message.id, text)
                        .reply_markup(exam_picker(catalog, CALLBACK_COUNTDOWN))
                        .await
                    {
                        tracing::debug!("Countdown message not edited: {}", e);
                    }
                    bot.answer_callback_query(q.id.clone()).await?;
                }
                Err(e) => {
                    bot.answer_callback_query(q.id.clone())
                        .text(e.to_string())
                        .await?;
                }
            }
        }
        CALLBACK_CHOOSE => {
            let Some(event) = ctx.engine.catalog().find(arg) else {
                bot.answer_callback_query(q.id.clone())
                    .text("That exam is no longer available")
                    .await?;
                return Ok(());
            };
            match choose_exam(&ctx, chat_id, event.key()).await {
                Ok(text) => {
                    bot.edit_message_text(chat_id, message.id, text).await?;
                    bot.answer_callback_query(q.id.clone()).text("Saved").await?;
                }
                Err(e) => {
                    log_command_error("choose", chat_id.0, &e.to_string());
                    bot.answer_callback_query(q.id.clone())
                        .text("Could not save your choice")
                        .await?;
                }
            }
        }
        CALLBACK_STUDY_DELETE => {
            let text = delete_study_entry(&ctx, chat_id, arg).await;
            bot.answer_callback_query(q.id.clone()).text(text).await?;
        }
        _ => {
            bot.answer_callback_query(q.id.clone())
                .text("Unknown button")
                .await?;
        }
    }
    Ok(())
}
