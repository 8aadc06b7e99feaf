use teloxide::prelude::*;

use crate::utils::feedback::CommandFeedback;

/// What to tell someone whose message matched nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hint {
    UnknownCommand(String),
    Countdown,
    Reminder,
    Help,
}

pub fn hint_for(text: &str) -> Option<Hint> {
    let lower = text.to_lowercase();
    if text.starts_with('/') {
        let command = text.split_whitespace().next().unwrap_or(text);
        Some(Hint::UnknownCommand(command.to_string()))
    } else if lower.contains("konkur") || lower.contains("exam") || lower.contains("کنکور") {
        Some(Hint::Countdown)
    } else if lower.contains("remind") || lower.contains("یادآور") {
        Some(Hint::Reminder)
    } else if lower.contains("help") {
        Some(Hint::Help)
    } else {
        None
    }
}

pub async fn handle_general_message(bot: Bot, chat_id: ChatId, text: &str) -> ResponseResult<()> {
    let feedback = CommandFeedback::new(bot, chat_id);

    match hint_for(text) {
        Some(Hint::UnknownCommand(command)) => {
            let error_msg = format!("Unknown command: {command}");
            let suggestion = "Use /help to see all available commands.";
            feedback.validation_error(&error_msg, suggestion).await?;
        }
        Some(Hint::Countdown) => {
            feedback
                .info("Use /left to see how long is left, or /exams for all exam dates.")
                .await?;
        }
        Some(Hint::Reminder) => {
            feedback
                .info("Set a daily reminder with /remind 20:00, or /remind 7:30 math,exp weekdays")
                .await?;
        }
        Some(Hint::Help) => {
            feedback.info("Use /help to see all available commands and examples!").await?;
        }
        // Stay quiet otherwise
        None => {}
    }

    Ok(())
}
