use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::commands::{countdown, reminders, study, Command};
use crate::bot::handlers::general_message::handle_general_message;
use crate::bot::handlers::HandlerResult;
use crate::bot::intent::{parse_text, Intent};
use crate::bot::keyboards::main_menu;
use crate::bot::AppContext;
use crate::utils::feedback::CommandFeedback;
use crate::utils::logging::log_command_start;

const WELCOME: &str = "📚 Welcome to the konkur countdown bot!\n\n\
Use the buttons below to see how long is left until your exam, \
set a daily reminder or log your study time.\n\
Use /help to see all commands.";

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: AppContext,
) -> HandlerResult {
    handle_intent(bot, msg, Intent::from(cmd), &ctx).await?;
    Ok(())
}

/// Keyboard buttons and free text
pub async fn text_handler(bot: Bot, msg: Message, ctx: AppContext) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let intent = parse_text(text);
    handle_intent(bot, msg, intent, &ctx).await?;
    Ok(())
}

pub async fn handle_intent(
    bot: Bot,
    msg: Message,
    intent: Intent,
    ctx: &AppContext,
) -> ResponseResult<()> {
    let user = msg
        .from()
        .and_then(|u| u.username.clone())
        .unwrap_or_else(|| "unknown".to_string());
    log_command_start(&format!("{intent:?}"), &user, msg.chat.id.0, None);

    match intent {
        Intent::Start => {
            CommandFeedback::new(bot, msg.chat.id)
                .plain(WELCOME, Some(main_menu().into()))
                .await?;
        }
        Intent::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Intent::ListExams => countdown::handle_exams(bot, msg, ctx).await?,
        Intent::ShowCountdown(exam) => countdown::handle_left(bot, msg, exam, ctx).await?,
        Intent::ChooseExam(exam) => countdown::handle_choose(bot, msg, exam, ctx).await?,
        Intent::SetReminder(args) => reminders::handle_remind(bot, msg, args, ctx).await?,
        Intent::EnableReminder => reminders::handle_remind_on(bot, msg, ctx).await?,
        Intent::DisableReminder => reminders::handle_remind_off(bot, msg, ctx).await?,
        Intent::ShowReminder => reminders::handle_reminder_status(bot, msg, ctx).await?,
        Intent::ForgetMe => reminders::handle_forget(bot, msg, ctx).await?,
        Intent::LogStudy(entry) => study::handle_study(bot, msg, entry, ctx).await?,
        Intent::ShowProgress => study::handle_progress(bot, msg, ctx).await?,
        Intent::DeleteStudy(number) => study::handle_unstudy(bot, msg, number, ctx).await?,
        Intent::Unknown(text) => handle_general_message(bot, msg.chat.id, &text).await?,
    }
    Ok(())
}
