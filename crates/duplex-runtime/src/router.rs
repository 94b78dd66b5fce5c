//! Routing engine
//!
//! Pure decision logic: given an inbound event from either network, work out
//! which messages go where. The router holds no state of its own beyond the
//! shared directory and never touches an adapter; it returns `Effect`s that
//! the sessions deliver.

use duplex_core::{
    command::{self, AdminCommand},
    format::{self, DEFAULT_MAX_MESSAGE_CHARS},
    types::normalize_name,
    ChannelId, ChatKind, ContactDirectory, ControlEvent, DirectoryError, Effect,
};
use tracing::{debug, info, warn};

const NOT_OWNER: &str = "You are not the owner of this bot";
const NO_SUCH_CONTACT: &str = "No contact found with that name";
const UNBOUND_GROUP: &str = "No contact is bound to this group";
const DIRECT_HINT: &str = "Unknown command, send /help for usage";

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Routing parameters, fixed at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Operator account; also the operator's direct channel
    pub operator_id: ChannelId,
    /// Control-network message length limit, in characters
    pub max_message_chars: usize,
}

impl RouterConfig {
    pub fn new(operator_id: ChannelId) -> Self {
        Self {
            operator_id,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }
}

// ----------------------------------------------------------------------------
// Router
// ----------------------------------------------------------------------------

/// Routing engine shared by both sessions
#[derive(Debug, Clone)]
pub struct Router {
    config: RouterConfig,
    directory: ContactDirectory,
}

impl Router {
    pub fn new(config: RouterConfig, directory: ContactDirectory) -> Self {
        Self { config, directory }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn directory(&self) -> &ContactDirectory {
        &self.directory
    }

    // ------------------------------------------------------------------------
    // Field -> Control
    // ------------------------------------------------------------------------

    /// Whether messages from `address` may be relayed at all
    pub fn accepts_field_sender(&self, address: &str) -> bool {
        !self.directory.is_blacklisted(address)
    }

    /// Route a text message from a (non-blacklisted) field sender
    pub fn route_field_message(&self, address: &str, text: &str) -> Vec<Effect> {
        let operator = self.config.operator_id;

        let (channel, body) = match self.directory.lookup_name_by_address(address) {
            None => {
                info!("Received message from unknown number: {}", address);
                (operator, format::unknown_sender_envelope(address, text))
            }
            Some(name) => {
                info!("Received message from {}", name);
                match self.directory.get_group(&name) {
                    // The group already identifies the sender.
                    Some(group) => (group, text.to_string()),
                    None => (operator, format::contact_envelope(&name, text)),
                }
            }
        };

        self.reply(channel, &body)
    }

    // ------------------------------------------------------------------------
    // Control -> Field
    // ------------------------------------------------------------------------

    /// Route any inbound control-network event
    pub fn route_control_event(&self, event: &ControlEvent) -> Vec<Effect> {
        if event.kind == ChatKind::Other || event.text.is_empty() {
            debug!(
                "Ignoring {:?} control event without text in channel {}",
                event.kind, event.channel_id
            );
            return Vec::new();
        }

        let from_operator_chat =
            event.kind == ChatKind::Direct && event.channel_id == self.config.operator_id;

        let parsed = match event.kind {
            ChatKind::Direct => command::parse(&event.text),
            ChatKind::Group | ChatKind::Other => command::parse_slashed(&event.text),
        };

        match parsed {
            Some(Ok(command)) => {
                if command.requires_operator() && !from_operator_chat {
                    return self.refuse(event);
                }
                self.execute(event.channel_id, command)
            }
            Some(Err(usage)) => {
                if !from_operator_chat {
                    return self.refuse(event);
                }
                self.reply(event.channel_id, &usage.to_string())
            }
            None => match event.kind {
                ChatKind::Group => self.relay_group_message(event),
                ChatKind::Direct if from_operator_chat => {
                    self.reply(event.channel_id, DIRECT_HINT)
                }
                ChatKind::Direct | ChatKind::Other => self.refuse(event),
            },
        }
    }

    /// Relay `text` to the contact named `name`, reporting misses on `reply_to`
    pub fn relay_to_contact(&self, reply_to: ChannelId, name: &str, text: &str) -> Vec<Effect> {
        match self.directory.lookup_address_by_name(name) {
            Some(address) => {
                info!("Relaying message to {} ({})", name, address);
                vec![Effect::SendField {
                    address,
                    text: text.to_string(),
                }]
            }
            None => {
                warn!("Cannot relay to unknown contact {:?}", name);
                self.reply(reply_to, &format!("Unknown contact: \"{}\"", name))
            }
        }
    }

    fn relay_group_message(&self, event: &ControlEvent) -> Vec<Effect> {
        if event.sender_id != self.config.operator_id {
            return self.refuse(event);
        }

        match self.directory.lookup_name_by_group(event.channel_id) {
            Some(name) => self.relay_to_contact(event.channel_id, &name, &event.text),
            None => self.reply(event.channel_id, UNBOUND_GROUP),
        }
    }

    // ------------------------------------------------------------------------
    // Administrative Commands
    // ------------------------------------------------------------------------

    fn execute(&self, channel: ChannelId, command: AdminCommand) -> Vec<Effect> {
        if command.is_mutation() {
            info!("Executing directory command {:?}", command);
        } else {
            debug!("Executing command {:?}", command);
        }

        let directory = &self.directory;

        let response = match command {
            AdminCommand::Help => format::HELP_TEXT.to_string(),
            AdminCommand::WhoAmI => channel.to_string(),
            AdminCommand::AddContact { name, address } => {
                outcome(directory.add_contact(&name, &address), "Contact added")
            }
            AdminCommand::RemoveContact { name } => {
                outcome(directory.remove_contact(&name), "Contact removed")
            }
            AdminCommand::Bind { name, group } => self.bind(&name, group),
            AdminCommand::Unbind { name } => {
                if directory.lookup_address_by_name(&name).is_none() {
                    NO_SUCH_CONTACT.to_string()
                } else if directory.get_group(&name).is_none() {
                    "Contact was not bound to a group".to_string()
                } else {
                    outcome(directory.set_group(&name, None), "Unbound from group")
                }
            }
            AdminCommand::ListContacts => format::render_contacts(&directory.list_contacts()),
            AdminCommand::ListBlacklist => format::render_blacklist(&directory.list_blacklist()),
            AdminCommand::AddBlacklist { address } => {
                outcome(directory.add_blacklist(&address), "Phone has been blacklisted")
            }
            AdminCommand::RemoveBlacklist { address } => {
                if !directory.is_blacklisted(&address) {
                    "That phone is not blacklisted".to_string()
                } else {
                    outcome(directory.remove_blacklist(&address), "Phone has been unblacklisted")
                }
            }
            AdminCommand::Send { name, text } => {
                return self.relay_to_contact(channel, &name, &text);
            }
        };

        self.reply(channel, &response)
    }

    fn bind(&self, name: &str, group: ChannelId) -> String {
        let directory = &self.directory;

        if directory.lookup_address_by_name(name).is_none() {
            return NO_SUCH_CONTACT.to_string();
        }

        match directory.lookup_name_by_group(group) {
            Some(bound) if bound != normalize_name(name) => {
                describe(DirectoryError::DuplicateGroup {
                    group,
                    bound_to: bound,
                })
            }
            _ => outcome(directory.set_group(name, Some(group)), "Bound to group"),
        }
    }

    // ------------------------------------------------------------------------
    // Replies
    // ------------------------------------------------------------------------

    fn refuse(&self, event: &ControlEvent) -> Vec<Effect> {
        warn!(
            "Refusing control message from {} in channel {}",
            event.sender_id, event.channel_id
        );
        self.reply(event.channel_id, NOT_OWNER)
    }

    /// Chunk `text` into control-network messages for `channel`
    fn reply(&self, channel: ChannelId, text: &str) -> Vec<Effect> {
        format::split_chunks(text, self.config.max_message_chars)
            .into_iter()
            .map(|chunk| Effect::SendControl {
                channel,
                text: chunk,
            })
            .collect()
    }
}

/// Operator-facing wording for directory rejections
fn describe(error: DirectoryError) -> String {
    match error {
        DirectoryError::NotFound => NO_SUCH_CONTACT.to_string(),
        DirectoryError::DuplicateContact => "A contact with those details already exists".to_string(),
        DirectoryError::DuplicateBlacklist => "That phone is already blacklisted".to_string(),
        DirectoryError::DuplicateGroup { bound_to, .. } => {
            format!("This group is already bound to {}", bound_to)
        }
        DirectoryError::Storage(reason) => format!("Directory error: {}", reason),
    }
}

fn outcome(result: Result<(), DirectoryError>, success: &str) -> String {
    match result {
        Ok(()) => success.to_string(),
        Err(e) => describe(e),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
