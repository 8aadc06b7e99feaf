pub mod countdown;
pub mod reminders;
pub mod study;

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case", description = "Konkur countdown bot commands:")]
pub enum Command {
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "List the exams and their dates")]
    Exams,
    #[command(description = "Time left until an exam, e.g. /left math")]
    Left(String),
    #[command(description = "Pick the exam you are taking, e.g. /choose exp")]
    Choose(String),
    #[command(description = "Daily reminder, e.g. /remind 20:00 math,exp weekdays")]
    Remind(String),
    #[command(description = "Turn your reminder back on")]
    RemindOn,
    #[command(description = "Pause your reminder")]
    RemindOff,
    #[command(description = "Show your reminder settings")]
    Reminder,
    #[command(description = "Delete all your data")]
    Forget,
    #[command(description = "Log study time: subject, start, end, hours")]
    Study(String),
    #[command(description = "Show your logged study time")]
    Progress,
    #[command(description = "Delete a study entry by its number in /progress")]
    Unstudy(String),
}
