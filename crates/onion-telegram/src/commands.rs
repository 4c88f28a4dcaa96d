//! Command parsing and reply texts

/// Parsed bot command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Greet the user and record the start
    Start,
    /// Show available commands
    Help,
}

impl Command {
    /// Parse a command from message text
    ///
    /// Accepts `/start` and `/help`, case-insensitively, optionally suffixed
    /// with `@BotName` and followed by arguments. When `bot_username` is known,
    /// commands addressed to another bot are ignored. Anything else yields
    /// `None`.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let body = token.strip_prefix('/')?;

        let (name, target) = match body.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (body, None),
        };

        if let (Some(target), Some(me)) = (target, bot_username) {
            if !target.eq_ignore_ascii_case(me) {
                return None;
            }
        }

        match name.to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    /// Command name without the leading slash
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
        }
    }

    /// Get a short description of the command
    pub fn description(self) -> &'static str {
        match self {
            Self::Start => "Start using the bot",
            Self::Help => "Show this help message",
        }
    }
}

/// Reply to `/start`
pub fn welcome_text(website_url: &str) -> String {
    format!("Welcome to Onion AI Bot!\n\nVisit our website: {website_url}")
}

/// Reply to `/help`
pub fn help_text(website_url: &str) -> String {
    let mut text = String::from("Available commands:\n");
    for command in [Command::Start, Command::Help] {
        text.push_str(&format!("/{} - {}\n", command.name(), command.description()));
    }
    text.push_str(&format!("\nVisit our website: {website_url}"));
    text
}
