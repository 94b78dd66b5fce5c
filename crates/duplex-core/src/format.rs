//! Message envelopes, listings and chunking

use crate::types::ContactEntry;

/// Default control-network message length limit, in characters
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 3000;

const ENVELOPE_RULE: &str = "---------";

pub const HELP_TEXT: &str = "duplex relay\n\n\
Usage:\n\n\
   /help -> shows this help message\n\
   /whoami -> shows the id of this chat\n\
   /add <name> <phone> -> add a new contact to the directory\n\
   /bind <name> <group id> -> bind a contact to a group\n\
   /contacts -> list contacts\n\
   /blacklist -> show blacklisted phones\n\
   /blacklist <phone> -> blacklist a phone number\n\
   /rm <name> -> remove a contact from the directory\n\
   /send <name> <message> -> send a message to a contact\n\
   /unbind <name> -> unbind a contact from its group\n\
   /unblacklist <phone> -> unblacklist a phone number\n\n\
Blacklisted phone numbers are ignored: nothing they send is relayed.";

// ----------------------------------------------------------------------------
// Envelopes
// ----------------------------------------------------------------------------

/// Wrapper for messages from addresses not in the directory
pub fn unknown_sender_envelope(address: &str, text: &str) -> String {
    format!(
        "Message from #unknown\nPhone number: {}\n{}\n{}",
        address, ENVELOPE_RULE, text
    )
}

/// Wrapper for messages from known, unbound contacts
pub fn contact_envelope(name: &str, text: &str) -> String {
    format!("Message from #{}\n{}\n{}", name, ENVELOPE_RULE, text)
}

// ----------------------------------------------------------------------------
// Listings
// ----------------------------------------------------------------------------

pub fn render_contacts(contacts: &[ContactEntry]) -> String {
    let mut response = String::from("Contacts:\n");
    for contact in contacts {
        response.push_str(&format!("- {} ({})", contact.name, contact.address));
        if let Some(group) = contact.group {
            response.push_str(&format!(" -> group {}", group));
        }
        response.push('\n');
    }
    response
}

pub fn render_blacklist(addresses: &[String]) -> String {
    let mut response = String::from("Blacklisted phones:\n\n");
    for address in addresses {
        response.push_str(&format!("- {}\n", address));
    }
    response
}

// ----------------------------------------------------------------------------
// Chunking
// ----------------------------------------------------------------------------

/// Split `text` into ordered chunks of at most `max_chars` characters.
///
/// Splits on character boundaries, never inside a UTF-8 sequence. Empty text
/// yields no chunks.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (index, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(text[start..index].to_string());
            start = index;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    chunks
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes() {
        let unknown = unknown_sender_envelope("+1555", "hi");
        assert!(unknown.contains("#unknown"));
        assert!(unknown.contains("+1555"));
        assert!(unknown.ends_with("\nhi"));

        assert_eq!(contact_envelope("alice", "hi"), "Message from #alice\n---------\nhi");
    }

    #[test]
    fn test_render_contacts() {
        let contacts = vec![
            ContactEntry {
                name: "alice".into(),
                address: "+1555".into(),
                group: Some(42),
            },
            ContactEntry {
                name: "bob".into(),
                address: "+1666".into(),
                group: None,
            },
        ];
        assert_eq!(
            render_contacts(&contacts),
            "Contacts:\n- alice (+1555) -> group 42\n- bob (+1666)\n"
        );
        assert_eq!(render_blacklist(&["+1999".to_string()]), "Blacklisted phones:\n\n- +1999\n");
    }

    #[test]
    fn test_split_chunks_preserves_order_and_limit() {
        let text = "abcdefghij";
        let chunks = split_chunks(text, 3);
        assert_eq!(chunks, vec!["abc", "def", "ghi", "j"]);
        assert_eq!(chunks.concat(), text);

        assert_eq!(split_chunks("short", DEFAULT_MAX_MESSAGE_CHARS), vec!["short"]);
        assert!(split_chunks("", 10).is_empty());
    }

    #[test]
    fn test_split_chunks_at_default_limit() {
        let exact = "x".repeat(DEFAULT_MAX_MESSAGE_CHARS);
        assert_eq!(split_chunks(&exact, DEFAULT_MAX_MESSAGE_CHARS), vec![exact.clone()]);

        let over = "é".repeat(DEFAULT_MAX_MESSAGE_CHARS + 1);
        let chunks = split_chunks(&over, DEFAULT_MAX_MESSAGE_CHARS);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), DEFAULT_MAX_MESSAGE_CHARS);
        assert_eq!(chunks[1], "é");
    }

    #[test]
    fn test_split_chunks_is_char_safe() {
        let text = "héllo wörld ✓✓";
        let chunks = split_chunks(text, 4);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
        assert_eq!(chunks.concat(), text);
    }
}
