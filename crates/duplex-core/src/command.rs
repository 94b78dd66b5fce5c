//! Administrative command grammar
//!
//! Commands arrive as control-network text. The leading `/` is optional in
//! direct chats; in group chats only slash-prefixed text is treated as a
//! command so ordinary chatter is relayed. A `/cmd@botname` suffix is
//! accepted and ignored.
//!
//! ```text
//! help | start
//! whoami | me
//! add <name> <address>
//! bind <name> <group-id>
//! unbind <name>
//! blacklist [address]
//! unblacklist <address>
//! contacts
//! rm <name>
//! send <name> <message...>
//! ```

use crate::types::ChannelId;

// ----------------------------------------------------------------------------
// Command Types
// ----------------------------------------------------------------------------

/// Parsed administrative command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Help,
    WhoAmI,
    AddContact { name: String, address: String },
    RemoveContact { name: String },
    Bind { name: String, group: ChannelId },
    Unbind { name: String },
    ListContacts,
    ListBlacklist,
    AddBlacklist { address: String },
    RemoveBlacklist { address: String },
    Send { name: String, text: String },
}

impl AdminCommand {
    /// Whether only the operator may run this command
    pub fn requires_operator(&self) -> bool {
        !matches!(self, AdminCommand::Help | AdminCommand::WhoAmI)
    }

    /// Whether running this command can change the directory
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            AdminCommand::AddContact { .. }
                | AdminCommand::RemoveContact { .. }
                | AdminCommand::Bind { .. }
                | AdminCommand::Unbind { .. }
                | AdminCommand::AddBlacklist { .. }
                | AdminCommand::RemoveBlacklist { .. }
        )
    }
}

/// Why a recognized command could not be parsed; the message is the reply
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("Syntax: {0}")]
    Syntax(&'static str),
    #[error("Group id has to be a number")]
    GroupNotNumeric,
}

// ----------------------------------------------------------------------------
// Parsing
// ----------------------------------------------------------------------------

/// Parse a command with an optional leading slash.
///
/// Returns `None` when the first word is not a command at all.
pub fn parse(text: &str) -> Option<Result<AdminCommand, UsageError>> {
    let trimmed = text.trim_start();
    let (word, rest) = split_word(trimmed.strip_prefix('/').unwrap_or(trimmed));
    parse_word(word, rest)
}

/// Parse a command only if the text starts with `/`
pub fn parse_slashed(text: &str) -> Option<Result<AdminCommand, UsageError>> {
    let stripped = text.trim_start().strip_prefix('/')?;
    let (word, rest) = split_word(stripped);
    parse_word(word, rest)
}

fn split_word(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(index) => (&text[..index], text[index..].trim_start()),
        None => (text, ""),
    }
}

fn parse_word(word: &str, rest: &str) -> Option<Result<AdminCommand, UsageError>> {
    // Drop a `@botname` mention suffix.
    let word = word.split('@').next().unwrap_or(word).to_lowercase();
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match word.as_str() {
        "help" | "start" => Ok(AdminCommand::Help),
        "whoami" | "me" => Ok(AdminCommand::WhoAmI),
        "add" => match args.as_slice() {
            [name, address] => Ok(AdminCommand::AddContact {
                name: name.to_string(),
                address: address.to_string(),
            }),
            _ => Err(UsageError::Syntax("/add <name> <phone>")),
        },
        "bind" => match args.as_slice() {
            [name, group] => group
                .parse::<ChannelId>()
                .map(|group| AdminCommand::Bind {
                    name: name.to_string(),
                    group,
                })
                .map_err(|_| UsageError::GroupNotNumeric),
            _ => Err(UsageError::Syntax("/bind <name> <group id>")),
        },
        "unbind" => match args.as_slice() {
            [name] => Ok(AdminCommand::Unbind {
                name: name.to_string(),
            }),
            _ => Err(UsageError::Syntax("/unbind <name>")),
        },
        "blacklist" => match args.as_slice() {
            [] => Ok(AdminCommand::ListBlacklist),
            [address] => Ok(AdminCommand::AddBlacklist {
                address: address.to_string(),
            }),
            _ => Err(UsageError::Syntax("/blacklist [phone]")),
        },
        "unblacklist" => match args.as_slice() {
            [address] => Ok(AdminCommand::RemoveBlacklist {
                address: address.to_string(),
            }),
            _ => Err(UsageError::Syntax("/unblacklist <phone>")),
        },
        "contacts" => Ok(AdminCommand::ListContacts),
        "rm" => match args.as_slice() {
            [name] => Ok(AdminCommand::RemoveContact {
                name: name.to_string(),
            }),
            _ => Err(UsageError::Syntax("/rm <name>")),
        },
        "send" => {
            // The message keeps its original spacing and line breaks.
            let (name, text) = split_word(rest);
            if name.is_empty() || text.trim().is_empty() {
                Err(UsageError::Syntax("/send <name> <message>"))
            } else {
                Ok(AdminCommand::Send {
                    name: name.to_string(),
                    text: text.to_string(),
                })
            }
        }
        _ => return None,
    };

    Some(command)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
