//! Chat command parsing.

use crate::error::FocusError;

/// A recognised chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `pomodoro [work[,] [break]]`
    Start {
        work_minutes: Option<i64>,
        break_minutes: Option<i64>,
    },
    Stop,
    Leave,
    Join,
    Status,
}

/// Parse a chat message.
///
/// Returns `None` for messages that are not commands (no prefix, or an
/// unknown command name). Durations accept `45, 15`, `45 15` and `45,15`;
/// anything beyond the second value is ignored.
pub fn parse_command(prefix: &str, text: &str) -> Option<Result<Command, FocusError>> {
    let rest = text.trim().strip_prefix(prefix)?;
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "pomodoro" => parse_durations(args).map(|(work_minutes, break_minutes)| Command::Start {
            work_minutes,
            break_minutes,
        }),
        "stop" => Ok(Command::Stop),
        "leave" => Ok(Command::Leave),
        "join" => Ok(Command::Join),
        "status" => Ok(Command::Status),
        _ => return None,
    };
    Some(command)
}

fn parse_durations(args: &str) -> Result<(Option<i64>, Option<i64>), FocusError> {
    let normalized = args.replace(',', " ");
    let mut values = normalized.split_whitespace().map(|raw| {
        raw.parse::<i64>()
            .map_err(|_| FocusError::InvalidArguments(format!("not a number of minutes: {raw}")))
    });
    let work = values.next().transpose()?;
    let rest = values.next().transpose()?;
    Ok((work, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(work: Option<i64>, rest: Option<i64>) -> Command {
        Command::Start {
            work_minutes: work,
            break_minutes: rest,
        }
    }

    #[test]
    fn bare_pomodoro_uses_defaults() {
        let cmd = parse_command("!", "!pomodoro").unwrap().unwrap();
        assert_eq!(cmd, start(None, None));
    }

    #[test]
    fn duration_separators() {
        for text in ["!pomodoro 45, 15", "!pomodoro 45 15", "!pomodoro 45,15", "  !pomodoro   45 ,15 "] {
            let cmd = parse_command("!", text).unwrap().unwrap();
            assert_eq!(cmd, start(Some(45), Some(15)), "{text}");
        }
    }

    #[test]
    fn single_value_sets_only_work() {
        let cmd = parse_command("!", "!pomodoro 50").unwrap().unwrap();
        assert_eq!(cmd, start(Some(50), None));
    }

    #[test]
    fn non_numeric_is_rejected() {
        let result = parse_command("!", "!pomodoro soon, 10").unwrap();
        assert!(matches!(result, Err(FocusError::InvalidArguments(_))));
        let result = parse_command("!", "!pomodoro 25 later").unwrap();
        assert!(matches!(result, Err(FocusError::InvalidArguments(_))));
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse_command("!", "!stop").unwrap().unwrap(), Command::Stop);
        assert_eq!(parse_command("!", "!leave").unwrap().unwrap(), Command::Leave);
        assert_eq!(parse_command("!", "!join").unwrap().unwrap(), Command::Join);
        assert_eq!(parse_command("!", "!status").unwrap().unwrap(), Command::Status);
    }

    #[test]
    fn non_commands_are_ignored() {
        assert!(parse_command("!", "hello there").is_none());
        assert!(parse_command("!", "!dance").is_none());
        assert!(parse_command("?", "!stop").is_none());
    }

    #[test]
    fn custom_prefix() {
        assert_eq!(parse_command("fg:", "fg:stop").unwrap().unwrap(), Command::Stop);
    }
}
