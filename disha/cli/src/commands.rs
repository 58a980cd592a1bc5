//! REPL command parsing

use disha_core::Tab;

/// One line of user input at the chat prompt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Plain text for the advisor
    Chat(String),
    /// Open the career explorer
    Careers,
    /// Play Skill Swipe
    Game,
    /// Toggle light/dark theme
    Theme,
    /// Show the active tab, or switch to one
    Tab(Option<Tab>),
    /// Print the command list
    Help,
    /// Leave
    Quit,
    /// Blank line
    Empty,
    /// Slash command that is not recognized (or a bad argument)
    Unknown(String),
}

impl Command {
    /// Parse a line of input
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Chat(trimmed.to_string());
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();

        match name.to_ascii_lowercase().as_str() {
            "careers" | "c" => Self::Careers,
            "game" | "g" => Self::Game,
            "theme" => Self::Theme,
            "tab" => match arg.map(str::parse::<Tab>) {
                None => Self::Tab(None),
                Some(Ok(tab)) => Self::Tab(Some(tab)),
                Some(Err(e)) => Self::Unknown(e),
            },
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(format!("unknown command '/{name}'")),
        }
    }
}

/// Help text for the chat prompt
pub const HELP: &str = "\
Commands:
  /careers      Explore career paths
  /game         Play Skill Swipe
  /theme        Toggle light/dark theme
  /tab [name]   Show or switch tab (chat, careers, games)
  /help         Show this help
  /quit         Leave
Anything else is sent to Disha.";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(
            Command::parse("  What should I study?  "),
            Command::Chat("What should I study?".to_string())
        );
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn test_commands() {
        assert_eq!(Command::parse("/careers"), Command::Careers);
        assert_eq!(Command::parse("/GAME"), Command::Game);
        assert_eq!(Command::parse("/q"), Command::Quit);
        assert_eq!(Command::parse("/tab"), Command::Tab(None));
        assert_eq!(Command::parse("/tab games"), Command::Tab(Some(Tab::Games)));
    }

    #[test]
    fn test_unknown() {
        assert!(matches!(Command::parse("/dance"), Command::Unknown(_)));
        assert!(matches!(Command::parse("/tab settings"), Command::Unknown(_)));
    }
}
