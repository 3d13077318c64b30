use teloxide::utils::command::BotCommands;

/// Every command starts with this character.
pub const COMMAND_PREFIX: char = '/';

#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Add a plan")]
    AddPlan,
    #[command(description = "Show my plans")]
    MyPlans,
    #[command(description = "Delete a plan (optionally: /deleteplan <number>)")]
    DeletePlan,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "/start",
            Command::Help => "/help",
            Command::AddPlan => "/addplan",
            Command::MyPlans => "/myplans",
            Command::DeletePlan => "/deleteplan",
        }
    }

    pub fn help_text() -> String {
        Command::descriptions().to_string()
    }
}

/// Splits `/name[@bot] args...` into a known command and its trimmed
/// arguments. Returns `None` for plain text and for unknown commands.
pub fn parse_command(text: &str, bot_username: &str) -> Option<(Command, String)> {
    let text = text.trim();
    if !text.starts_with(COMMAND_PREFIX) {
        return None;
    }

    let (head, args) = match text.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (text, ""),
    };

    Command::parse(head, bot_username)
        .ok()
        .map(|command| (command, args.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(parse_command("/start", ""), Some((Command::Start, String::new())));
        assert_eq!(parse_command("/addplan", ""), Some((Command::AddPlan, String::new())));
        assert_eq!(parse_command("/myplans", ""), Some((Command::MyPlans, String::new())));
        assert_eq!(
            parse_command("/deleteplan  2 ", ""),
            Some((Command::DeletePlan, "2".to_string()))
        );
    }

    #[test]
    fn test_parse_with_bot_mention() {
        assert_eq!(
            parse_command("/help@plan_bot", "plan_bot"),
            Some((Command::Help, String::new()))
        );
        assert_eq!(parse_command("/help@other_bot", "plan_bot"), None);
    }

    #[test]
    fn test_parse_rejects_text_and_unknown() {
        assert_eq!(parse_command("hello", ""), None);
        assert_eq!(parse_command("/dance", ""), None);
        assert_eq!(parse_command("", ""), None);
    }

    #[test]
    fn test_help_lists_all_commands() {
        let help = Command::help_text();
        for name in ["/start", "/help", "/addplan", "/myplans", "/deleteplan"] {
            assert!(help.contains(name), "help is missing {name}");
        }
    }
}
