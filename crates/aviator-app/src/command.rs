//! User commands and the console command parser.

use aviator_ui::LayoutMode;

use crate::AppError;

/// Action requested by the user.
#[derive(Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Submit a PIN to the authorization gate.
    SubmitPin(String),
    /// Launch the entry with this id.
    Launch(String),
    /// Launch the entry shown in the detail view.
    LaunchSelected,
    /// Open the detail view for this id.
    OpenDetails(String),
    /// Close the detail view.
    CloseDetails,
    /// Manual connection retry.
    Retry,
    /// End the session.
    Logout,
    /// Switch catalog presentation.
    SetLayout(LayoutMode),
    /// Stop the client.
    Quit,
}

impl std::fmt::Debug for UserCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubmitPin(_) => f.write_str("SubmitPin(<redacted>)"),
            Self::Launch(id) => f.debug_tuple("Launch").field(id).finish(),
            Self::LaunchSelected => f.write_str("LaunchSelected"),
            Self::OpenDetails(id) => f.debug_tuple("OpenDetails").field(id).finish(),
            Self::CloseDetails => f.write_str("CloseDetails"),
            Self::Retry => f.write_str("Retry"),
            Self::Logout => f.write_str("Logout"),
            Self::SetLayout(mode) => f.debug_tuple("SetLayout").field(mode).finish(),
            Self::Quit => f.write_str("Quit"),
        }
    }
}

/// Console help text.
pub const COMMAND_HELP: &str = "commands: pin <PIN> | launch [id] | open <id> | close | retry | \
     logout | layout grid|list | quit";

/// Parses one console line.
///
/// Blank lines yield `Ok(None)`.
///
/// # Errors
/// Returns [`AppError::Command`] for unknown verbs or missing arguments.
pub fn parse_command(line: &str) -> Result<Option<UserCommand>, AppError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match (verb.to_ascii_lowercase().as_str(), rest) {
        ("pin", pin) if !pin.is_empty() => UserCommand::SubmitPin(pin.to_string()),
        ("launch", "") => UserCommand::LaunchSelected,
        ("launch", id) => UserCommand::Launch(id.to_string()),
        ("open", id) if !id.is_empty() => UserCommand::OpenDetails(id.to_string()),
        ("close", "") => UserCommand::CloseDetails,
        ("retry", "") => UserCommand::Retry,
        ("logout", "") => UserCommand::Logout,
        ("layout", mode) => match mode.to_ascii_lowercase().as_str() {
            "grid" => UserCommand::SetLayout(LayoutMode::Grid),
            "list" => UserCommand::SetLayout(LayoutMode::List),
            _ => return Err(AppError::Command(format!("unknown layout `{mode}`"))),
        },
        ("quit" | "exit", "") => UserCommand::Quit,
        ("pin", _) => return Err(AppError::Command("pin requires a value".to_string())),
        ("open", _) => return Err(AppError::Command("open requires an app id".to_string())),
        _ => return Err(AppError::Command(format!("unrecognized `{line}`"))),
    };
    Ok(Some(command))
}
