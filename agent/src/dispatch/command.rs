//! Parsing of typed commands and button callback tokens.

/// Every action the agent understands, plus the unknown remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    Menu,
    Ping,
    Help,
    Status,
    Msg,
    Warning,
    Alert,
    Test,
    Demo,
    Shutdown,
    Restart,
    Unknown(String),
}

impl Action {
    /// `name` must already be lower-cased with any leading `/` removed.
    fn from_name(name: &str) -> Self {
        match name {
            "start" => Self::Start,
            "menu" => Self::Menu,
            "ping" => Self::Ping,
            "help" => Self::Help,
            "status" => Self::Status,
            "msg" => Self::Msg,
            "warning" => Self::Warning,
            "alert" => Self::Alert,
            "test" => Self::Test,
            "demo" => Self::Demo,
            "shutdown" => Self::Shutdown,
            "restart" => Self::Restart,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Must name this device (or `all`) as target.
    pub fn is_per_device(&self) -> bool {
        matches!(
            self,
            Self::Msg
                | Self::Warning
                | Self::Alert
                | Self::Status
                | Self::Shutdown
                | Self::Restart
                | Self::Test
        )
    }
}

/// A typed command: `action [target [args...]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub action: Action,
    pub target: Option<String>,
    pub args: Option<String>,
}

impl Command {
    /// Split into at most three whitespace-separated parts; the third keeps
    /// the rest of the text verbatim. Returns `None` for blank input.
    pub fn parse(text: &str) -> Option<Self> {
        let (head, rest) = split_word(text)?;
        let (target, args) = match split_word(rest.unwrap_or_default()) {
            Some((target, args)) => (Some(target.to_lowercase()), args.map(str::to_string)),
            None => (None, None),
        };

        let name = head.to_lowercase();
        let name = name.strip_prefix('/').unwrap_or(&name);
        // Group chats deliver commands as `/start@BotName`.
        let name = name.split('@').next().unwrap_or_default();

        Some(Self {
            action: Action::from_name(name),
            target,
            args,
        })
    }

    /// Whether the target names this device (case-insensitive) or `all`.
    pub fn targets(&self, device_name: &str) -> bool {
        match self.target.as_deref() {
            Some("all") => true,
            Some(target) => target == device_name.to_lowercase(),
            None => false,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.target.as_deref() == Some("all")
    }
}

/// First word and the trimmed remainder (if any) of `text`.
fn split_word(text: &str) -> Option<(&str, Option<&str>)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => {
            let rest = rest.trim_start();
            Some((word, (!rest.is_empty()).then_some(rest)))
        }
        None => Some((text, None)),
    }
}

/// Data carried by the inline buttons the agent sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackToken {
    Status,
    SendMsg,
    MsgInfo,
    MsgWarning,
    MsgSuccess,
    MsgEmergency,
    Warning,
    Alert,
    Test,
    Demo,
    ShutdownConfirm,
    ShutdownNow,
    RestartConfirm,
    RestartNow,
    Ping,
    Help,
    Menu,
}

impl CallbackToken {
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "status" => Self::Status,
            "send_msg" => Self::SendMsg,
            "msg_info" => Self::MsgInfo,
            "msg_warning" => Self::MsgWarning,
            "msg_success" => Self::MsgSuccess,
            "msg_emergency" => Self::MsgEmergency,
            "warning" => Self::Warning,
            "alert" => Self::Alert,
            "test" => Self::Test,
            "demo" => Self::Demo,
            "shutdown_confirm" => Self::ShutdownConfirm,
            "shutdown_now" => Self::ShutdownNow,
            "restart_confirm" => Self::RestartConfirm,
            "restart_now" => Self::RestartNow,
            "ping" => Self::Ping,
            "help" => Self::Help,
            "menu" => Self::Menu,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::SendMsg => "send_msg",
            Self::MsgInfo => "msg_info",
            Self::MsgWarning => "msg_warning",
            Self::MsgSuccess => "msg_success",
            Self::MsgEmergency => "msg_emergency",
            Self::Warning => "warning",
            Self::Alert => "alert",
            Self::Test => "test",
            Self::Demo => "demo",
            Self::ShutdownConfirm => "shutdown_confirm",
            Self::ShutdownNow => "shutdown_now",
            Self::RestartConfirm => "restart_confirm",
            Self::RestartNow => "restart_now",
            Self::Ping => "ping",
            Self::Help => "help",
            Self::Menu => "menu",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_target_and_verbatim_args() {
        let cmd = Command::parse("MSG Office  Hello   there,  world").unwrap();
        assert_eq!(cmd.action, Action::Msg);
        assert_eq!(cmd.target.as_deref(), Some("office"));
        assert_eq!(cmd.args.as_deref(), Some("Hello   there,  world"));
    }

    #[test]
    fn strips_slash_and_bot_suffix() {
        assert_eq!(Command::parse("/Start").unwrap().action, Action::Start);
        assert_eq!(Command::parse("/menu@DeskBot").unwrap().action, Action::Menu);
    }

    #[test]
    fn blank_input_is_none() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("   \n"), None);
    }

    #[test]
    fn unknown_action_keeps_name() {
        let cmd = Command::parse("reboot now").unwrap();
        assert_eq!(cmd.action, Action::Unknown("reboot".into()));
        assert_eq!(cmd.target.as_deref(), Some("now"));
        assert_eq!(cmd.args, None);
    }

    #[test]
    fn target_matching() {
        let cmd = Command::parse("warning OFFICE").unwrap();
        assert!(cmd.targets("office"));
        assert!(cmd.targets("Office"));
        assert!(!cmd.targets("laptop"));
        assert!(Command::parse("status all").unwrap().targets("laptop"));
        assert!(!Command::parse("status").unwrap().targets("laptop"));
    }

    #[test]
    fn action_classes() {
        assert!(Action::Status.is_per_device());
        assert!(!Action::Ping.is_per_device());
        assert!(!Action::Demo.is_per_device());
        assert!(Action::Shutdown.is_per_device());
    }

    #[test]
    fn callback_tokens_round_trip() {
        for token in [
            "status", "send_msg", "msg_info", "msg_warning", "msg_success", "msg_emergency",
            "warning", "alert", "test", "demo", "shutdown_confirm", "shutdown_now",
            "restart_confirm", "restart_now", "ping", "help", "menu",
        ] {
            assert_eq!(CallbackToken::parse(token).unwrap().as_str(), token);
        }
        assert_eq!(CallbackToken::parse("format_disk"), None);
    }
}
