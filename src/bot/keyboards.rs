use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::bot::intent::{
    BUTTON_CHOOSE_EXAM, BUTTON_MY_REMINDER, BUTTON_PROGRESS, BUTTON_REMINDER_OFF,
    BUTTON_REMINDER_ON, BUTTON_REMINDER_TIME, BUTTON_TIME_LEFT,
};
use crate::database::models::StudyEntry;
use crate::exams::ExamCatalog;

/// Callback prefix: show the countdown for an exam
pub const CALLBACK_COUNTDOWN: &str = "exam";
/// Callback prefix: make an exam the preferred one
pub const CALLBACK_CHOOSE: &str = "choose";
/// Callback prefix: delete a study entry by id
pub const CALLBACK_STUDY_DELETE: &str = "study_del";

const EXAMS_PER_ROW: usize = 2;

pub fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(BUTTON_TIME_LEFT)],
        vec![
            KeyboardButton::new(BUTTON_CHOOSE_EXAM),
            KeyboardButton::new(BUTTON_MY_REMINDER),
        ],
        vec![
            KeyboardButton::new(BUTTON_REMINDER_ON),
            KeyboardButton::new(BUTTON_REMINDER_OFF),
        ],
        vec![
            KeyboardButton::new(BUTTON_REMINDER_TIME),
            KeyboardButton::new(BUTTON_PROGRESS),
        ],
    ])
}

/// One button per exam; `action` is one of the callback prefixes
pub fn exam_picker(catalog: &ExamCatalog, action: &str) -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = catalog
        .events()
        .iter()
        .map(|event| {
            InlineKeyboardButton::callback(event.name(), format!("{action}:{}", event.key()))
        })
        .collect();

    InlineKeyboardMarkup::new(buttons.chunks(EXAMS_PER_ROW).map(|row| row.to_vec()))
}

/// A delete button under each listed study entry
pub fn study_entries(entries: &[StudyEntry]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(entries.iter().enumerate().map(|(i, entry)| {
        vec![InlineKeyboardButton::callback(
            format!("❌ {}. {}", i + 1, entry.subject),
            format!("{CALLBACK_STUDY_DELETE}:{}", entry.id),
        )]
    }))
}

/// Splits callback data into its prefix and argument
pub fn parse_callback(data: &str) -> Option<(&str, &str)> {
    data.split_once(':')
        .filter(|(action, arg)| !action.is_empty() && !arg.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_picker_layout() {
        let catalog = ExamCatalog::konkur_1405().unwrap();
        let markup = exam_picker(&catalog, CALLBACK_COUNTDOWN);
        let rows = &markup.inline_keyboard;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[2].len(), 1);
        assert_eq!(rows[0][0].text, "Mathematics");
    }

    #[test]
    fn test_parse_callback() {
        assert_eq!(parse_callback("exam:math"), Some(("exam", "math")));
        assert_eq!(
            parse_callback("study_del:550e8400-e29b-41d4-a716-446655440000"),
            Some(("study_del", "550e8400-e29b-41d4-a716-446655440000"))
        );
        assert_eq!(parse_callback("exam:"), None);
        assert_eq!(parse_callback("garbage"), None);
    }
}
