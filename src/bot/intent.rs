//! Turns commands, keyboard buttons and free text into an [`Intent`].
//!
//! Handlers only ever see an intent; the wording of buttons lives here.

use crate::bot::commands::Command;
use crate::utils::validation::parse_time_of_day;

pub const BUTTON_TIME_LEFT: &str = "⏳ Time left";
pub const BUTTON_CHOOSE_EXAM: &str = "🎯 Choose exam";
pub const BUTTON_REMINDER_ON: &str = "🔔 Reminder on";
pub const BUTTON_REMINDER_OFF: &str = "🔕 Reminder off";
pub const BUTTON_MY_REMINDER: &str = "⏰ My reminder";
pub const BUTTON_REMINDER_TIME: &str = "🕗 Reminder time";
pub const BUTTON_PROGRESS: &str = "📊 Study progress";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Start,
    Help,
    ListExams,
    /// `None` reports the subscriber's preferred exam
    ShowCountdown(Option<String>),
    /// `None` asks which exam to pick
    ChooseExam(Option<String>),
    /// Raw `/remind` arguments; empty asks for a time
    SetReminder(String),
    EnableReminder,
    DisableReminder,
    ShowReminder,
    ForgetMe,
    LogStudy(String),
    ShowProgress,
    DeleteStudy(String),
    Unknown(String),
}

fn optional_arg(arg: String) -> Option<String> {
    let arg = arg.trim();
    (!arg.is_empty()).then(|| arg.to_string())
}

impl From<Command> for Intent {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Help => Intent::Help,
            Command::Start => Intent::Start,
            Command::Exams => Intent::ListExams,
            Command::Left(exam) => Intent::ShowCountdown(optional_arg(exam)),
            Command::Choose(exam) => Intent::ChooseExam(optional_arg(exam)),
            Command::Remind(args) => Intent::SetReminder(args.trim().to_string()),
            Command::RemindOn => Intent::EnableReminder,
            Command::RemindOff => Intent::DisableReminder,
            Command::Reminder => Intent::ShowReminder,
            Command::Forget => Intent::ForgetMe,
            Command::Study(entry) => Intent::LogStudy(entry.trim().to_string()),
            Command::Progress => Intent::ShowProgress,
            Command::Unstudy(n) => Intent::DeleteStudy(n.trim().to_string()),
        }
    }
}

/// Classifies a non-command message
pub fn parse_text(text: &str) -> Intent {
    let text = text.trim();
    match text {
        BUTTON_TIME_LEFT => Intent::ShowCountdown(None),
        BUTTON_CHOOSE_EXAM => Intent::ChooseExam(None),
        BUTTON_REMINDER_ON => Intent::EnableReminder,
        BUTTON_REMINDER_OFF => Intent::DisableReminder,
        BUTTON_MY_REMINDER => Intent::ShowReminder,
        BUTTON_REMINDER_TIME => Intent::SetReminder(String::new()),
        BUTTON_PROGRESS => Intent::ShowProgress,
        _ if looks_like_time(text) => Intent::SetReminder(text.to_string()),
        _ if looks_like_study_entry(text) => Intent::LogStudy(text.to_string()),
        _ => Intent::Unknown(text.to_string()),
    }
}

// A bare "20:00" answers the reminder time prompt
fn looks_like_time(text: &str) -> bool {
    text.contains(':') && parse_time_of_day(text).is_ok()
}

// "subject، 14:00، 16:00، 2" typed without the /study command
fn looks_like_study_entry(text: &str) -> bool {
    text.split([',', '،']).count() == 4
}
