use konkur_countdown_bot::bot::commands::Command;
use konkur_countdown_bot::bot::intent::{parse_text, Intent, BUTTON_TIME_LEFT};
use teloxide::utils::command::BotCommands;

#[cfg(test)]
mod command_parsing_tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        let cases = [
            ("/help", Command::Help),
            ("/start", Command::Start),
            ("/exams", Command::Exams),
            ("/remind_on", Command::RemindOn),
            ("/remind_off", Command::RemindOff),
            ("/reminder", Command::Reminder),
            ("/forget", Command::Forget),
            ("/progress", Command::Progress),
        ];

        for (input, expected) in cases {
            let result = Command::parse(input, "testbot");
            assert_eq!(result.ok(), Some(expected), "parsing {input}");
        }
    }

    #[test]
    fn test_left_with_and_without_exam() {
        assert_eq!(
            Command::parse("/left math", "testbot").unwrap(),
            Command::Left("math".to_string())
        );
        assert_eq!(
            Command::parse("/left", "testbot").unwrap(),
            Command::Left(String::new())
        );
    }

    #[test]
    fn test_remind_keeps_all_arguments() {
        let cmd = Command::parse("/remind 20:00 math,exp weekdays", "testbot").unwrap();
        assert_eq!(cmd, Command::Remind("20:00 math,exp weekdays".to_string()));
    }

    #[test]
    fn test_command_with_bot_mention() {
        let cmd = Command::parse("/choose@testbot exp", "testbot").unwrap();
        assert_eq!(cmd, Command::Choose("exp".to_string()));
    }

    #[test]
    fn test_study_entry_with_persian_commas() {
        let cmd = Command::parse("/study فیزیک، 14:00، 16:00، 2", "testbot").unwrap();
        assert_eq!(Intent::from(cmd), Intent::LogStudy("فیزیک، 14:00، 16:00، 2".to_string()));
    }

    #[test]
    fn test_unknown_command_fails() {
        assert!(Command::parse("/schedule", "testbot").is_err());
    }

    #[test]
    fn test_descriptions_list_every_command() {
        let help = Command::descriptions().to_string();
        for name in ["/left", "/choose", "/remind", "/remind_on", "/remind_off", "/study", "/unstudy"] {
            assert!(help.contains(name), "help text is missing {name}");
        }
    }

    #[test]
    fn test_button_text_and_command_agree() {
        assert_eq!(
            parse_text(BUTTON_TIME_LEFT),
            Intent::from(Command::Left(String::new()))
        );
    }
}
