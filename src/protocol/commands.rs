//! Module `commands`
//!
//! Parses client lines and operator console lines into commands.
//! All matching is by prefix: `/exit-now` is an exit, `/sayhello` is plain chat.

/// Any line starting with this disconnects the client.
pub const EXIT_PREFIX: &str = "/exit";
/// Explicit room broadcast.
pub const SAY_PREFIX: &str = "/say ";
/// Directed message, `/say @<name> <message>`.
pub const DIRECT_PREFIX: &str = "/say @";
/// Operator broadcast on the server console.
pub const ADMIN_BROADCAST_PREFIX: &str = "/bc ";

/// A command parsed from a client line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    /// `/say <text>`, prefix stripped.
    Say(String),
    /// `/say @<target> <body>`. `body` is `None` when the message is missing.
    Direct {
        target: String,
        body: Option<String>,
    },
    /// Any other line, relayed verbatim.
    Chat(String),
}

/// A command parsed from an operator console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Broadcast(String),
    Ignored,
}

/// Parses a client line (terminator already stripped) into a `Command`.
pub fn parse_command(line: &str) -> Command {
    if line.starts_with(EXIT_PREFIX) {
        return Command::Exit;
    }

    if let Some(rest) = line.strip_prefix(DIRECT_PREFIX) {
        let (target, body) = match rest.split_once(' ') {
            Some((target, body)) => (target, Some(body)),
            None => (rest, None),
        };
        let body = body.filter(|body| !body.is_empty() && !target.is_empty());
        return Command::Direct {
            target: target.to_string(),
            body: body.map(str::to_string),
        };
    }

    if let Some(text) = line.strip_prefix(SAY_PREFIX) {
        return Command::Say(text.to_string());
    }

    Command::Chat(line.to_string())
}

/// Parses an operator console line. Only `/bc <text>` does anything.
pub fn parse_admin_command(line: &str) -> AdminCommand {
    match line.strip_prefix(ADMIN_BROADCAST_PREFIX) {
        Some(text) => AdminCommand::Broadcast(text.to_string()),
        None => AdminCommand::Ignored,
    }
}

/// Turns the handshake line into a display name.
///
/// Surrounding whitespace is trimmed and the result truncated to
/// `max_chars` characters. A blank line yields `None`.
pub fn parse_name(line: &str, max_chars: usize) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_chars).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exit_is_prefix_match() {
        assert_eq!(parse_command("/exit"), Command::Exit);
        assert_eq!(parse_command("/exit-now"), Command::Exit);
        assert_eq!(parse_command("/exit please"), Command::Exit);
        assert_eq!(
            parse_command(" /exit"),
            Command::Chat(" /exit".to_string())
        );
    }

    #[test]
    fn test_parse_say() {
        assert_eq!(
            parse_command("/say hello room"),
            Command::Say("hello room".to_string())
        );
        assert_eq!(parse_command("/say "), Command::Say(String::new()));
    }

    #[test]
    fn test_say_without_space_is_plain_chat() {
        assert_eq!(
            parse_command("/sayhello"),
            Command::Chat("/sayhello".to_string())
        );
        assert_eq!(parse_command("/say"), Command::Chat("/say".to_string()));
    }

    #[test]
    fn test_parse_direct_message() {
        assert_eq!(
            parse_command("/say @bob hello there"),
            Command::Direct {
                target: "bob".to_string(),
                body: Some("hello there".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_direct_without_body_is_malformed() {
        assert_eq!(
            parse_command("/say @bob"),
            Command::Direct {
                target: "bob".to_string(),
                body: None,
            }
        );
        assert_eq!(
            parse_command("/say @bob "),
            Command::Direct {
                target: "bob".to_string(),
                body: None,
            }
        );
        assert_eq!(
            parse_command("/say @ hi"),
            Command::Direct {
                target: String::new(),
                body: None,
            }
        );
    }

    #[test]
    fn test_other_lines_are_chat() {
        assert_eq!(
            parse_command("just talking"),
            Command::Chat("just talking".to_string())
        );
        assert_eq!(parse_command(""), Command::Chat(String::new()));
    }

    #[test]
    fn test_parse_admin_command() {
        assert_eq!(
            parse_admin_command("/bc maintenance at noon"),
            AdminCommand::Broadcast("maintenance at noon".to_string())
        );
        assert_eq!(parse_admin_command("/bc"), AdminCommand::Ignored);
        assert_eq!(parse_admin_command("hello"), AdminCommand::Ignored);
    }

    #[test]
    fn test_parse_name() {
        assert_eq!(parse_name("  alice \r", 32), Some("alice".to_string()));
        assert_eq!(parse_name("   ", 32), None);
        assert_eq!(parse_name("", 32), None);
        assert_eq!(parse_name("bartholomew", 4), Some("bart".to_string()));
        assert_eq!(parse_name("élodie", 2), Some("él".to_string()));
    }
}
