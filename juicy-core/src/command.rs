//! Command translator: one raw input line to one [`Action`].
//!
//! Local commands (`quit`, `clear`, `list`) never leave the process.
//! Everything else is forwarded to the server as `<token> <remainder>`.

/// Optional marker users may put in front of a command (`/join_room A`).
pub const COMMAND_PREFIX: char = '/';

/// Which registry sections `list` should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMode {
    /// Mode label as typed (lower-cased), or `all` when omitted.
    pub label: String,
    pub users: bool,
    pub rooms: bool,
}

impl ListMode {
    /// Interpret the argument of `list`.
    pub fn parse(arg: &str) -> Self {
        let arg = arg.trim().to_lowercase();
        if arg.is_empty() || arg == "all" {
            return Self {
                label: "all".into(),
                users: true,
                rooms: true,
            };
        }
        Self {
            users: arg.starts_with("user"),
            rooms: arg.starts_with("room"),
            label: arg,
        }
    }
}

/// What the client should do with one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Blank line: no output, no network traffic.
    Ignore,
    /// Close the connection and end the session.
    Quit,
    /// Redraw the boot screen.
    Clear,
    /// Show the session registry.
    List(ListMode),
    /// Send this canonical command text to the server.
    Forward(String),
}

/// Translate a raw input line.
pub fn translate(line: &str) -> Action {
    let line = line.trim();
    if line.is_empty() {
        return Action::Ignore;
    }

    let (token, remainder) = match line.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim_start()),
        None => (line, ""),
    };
    let token = token.strip_prefix(COMMAND_PREFIX).unwrap_or(token);

    match token.to_lowercase().as_str() {
        "quit" => Action::Quit,
        "clear" => Action::Clear,
        "list" => Action::List(ListMode::parse(remainder)),
        _ if remainder.is_empty() => Action::Forward(token.to_owned()),
        _ => Action::Forward(format!("{token} {remainder}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(translate(""), Action::Ignore);
        assert_eq!(translate("   \t "), Action::Ignore);
    }

    #[test]
    fn prefixed_command_is_forwarded_without_prefix() {
        assert_eq!(
            translate("/create_room Lobby"),
            Action::Forward("create_room Lobby".into())
        );
    }

    #[test]
    fn bare_token_is_forwarded_alone() {
        assert_eq!(translate("room_info"), Action::Forward("room_info".into()));
    }

    #[test]
    fn casing_is_preserved() {
        assert_eq!(
            translate("  Set_Name   Alice Smith "),
            Action::Forward("Set_Name Alice Smith".into())
        );
    }

    #[test]
    fn only_one_prefix_is_stripped() {
        assert_eq!(translate("//say hi"), Action::Forward("/say hi".into()));
    }

    #[test]
    fn local_commands_any_case() {
        assert_eq!(translate("QUIT"), Action::Quit);
        assert_eq!(translate("/quit now"), Action::Quit);
        assert_eq!(translate("/Clear"), Action::Clear);
        assert!(matches!(translate("LiSt"), Action::List(_)));
    }

    #[test]
    fn list_modes() {
        let Action::List(all) = translate("list") else {
            panic!("expected list");
        };
        assert_eq!(all.label, "all");
        assert!(all.users && all.rooms);

        let Action::List(users) = translate("/list USERS") else {
            panic!("expected list");
        };
        assert_eq!(users.label, "users");
        assert!(users.users && !users.rooms);

        let Action::List(rooms) = translate("list room") else {
            panic!("expected list");
        };
        assert!(!rooms.users && rooms.rooms);

        let Action::List(other) = translate("list friends") else {
            panic!("expected list");
        };
        assert!(!other.users && !other.rooms);
    }

    proptest! {
        #[test]
        fn local_tokens_never_forward(
            token in prop::sample::select(vec!["quit", "clear", "list"]),
            upper in any::<bool>(),
            prefixed in any::<bool>(),
            rest in "[ a-z]{0,10}",
        ) {
            let token = if upper { token.to_uppercase() } else { token.to_owned() };
            let prefix = if prefixed { "/" } else { "" };
            let line = format!("{prefix}{token} {rest}");
            prop_assert!(!matches!(translate(&line), Action::Forward(_)));
        }

        #[test]
        fn forwarded_form_is_token_then_remainder(
            token in "[A-Za-z_]{1,10}",
            rest in "([A-Za-z0-9]{1,6}( [A-Za-z0-9]{1,6}){0,2})?",
        ) {
            let lower = token.to_lowercase();
            prop_assume!(lower != "quit" && lower != "clear" && lower != "list");
            let expected = if rest.is_empty() {
                token.clone()
            } else {
                format!("{token} {rest}")
            };
            prop_assert_eq!(translate(&format!("/{token} {rest}")), Action::Forward(expected));
        }
    }
}
