//! Parsing of the free-form identifiers the model passes to the Discord tools

use once_cell::sync::Lazy;
use regex::Regex;

static USER_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<@!?(\d+)>$").unwrap());
static CHANNEL_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<#(\d+)>$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(u64),
    /// Username first, then display name
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelLookup {
    Current,
    Id(u64),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionTarget {
    pub emoji: String,
    /// Raw message id as written; validated by the caller
    pub message_id: Option<String>,
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// `<@123>`, `<@!123>` and `123` all resolve to the same id
pub fn parse_user_identifier(input: &str) -> UserLookup {
    let input = input.trim();
    if let Some(caps) = USER_MENTION.captures(input) {
        if let Ok(id) = caps[1].parse() {
            return UserLookup::Id(id);
        }
    }
    if all_digits(input) {
        if let Ok(id) = input.parse() {
            return UserLookup::Id(id);
        }
    }
    UserLookup::Name(input.to_string())
}

pub fn parse_channel_identifier(input: &str) -> ChannelLookup {
    let input = input.trim();
    if input.is_empty() {
        return ChannelLookup::Current;
    }
    if let Some(caps) = CHANNEL_MENTION.captures(input) {
        if let Ok(id) = caps[1].parse() {
            return ChannelLookup::Id(id);
        }
    }
    if all_digits(input) {
        if let Ok(id) = input.parse() {
            return ChannelLookup::Id(id);
        }
    }
    ChannelLookup::Name(input.trim_start_matches('#').to_string())
}

/// Split `emoji:message_id` at the first colon outside a custom emoji token.
/// An empty id after the colon targets the triggering message.
pub fn parse_reaction_input(input: &str) -> ReactionTarget {
    let input = input.trim();
    let search_from = if input.starts_with('<') {
        input.find('>').map(|i| i + 1).unwrap_or(0)
    } else {
        0
    };

    match input[search_from..].find(':') {
        Some(offset) => {
            let split = search_from + offset;
            let emoji = input[..split].trim().to_string();
            let id = input[split + 1..].trim();
            ReactionTarget {
                emoji,
                message_id: if id.is_empty() { None } else { Some(id.to_string()) },
            }
        }
        None => ReactionTarget {
            emoji: input.to_string(),
            message_id: None,
        },
    }
}

/// Parse a message id written by the model
pub fn parse_message_id(raw: &str) -> Option<u64> {
    if all_digits(raw) { raw.parse().ok() } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_identifier_forms() {
        assert_eq!(parse_user_identifier("<@123>"), UserLookup::Id(123));
        assert_eq!(parse_user_identifier("<@!123>"), UserLookup::Id(123));
        assert_eq!(parse_user_identifier("123"), UserLookup::Id(123));
        assert_eq!(parse_user_identifier(" 123 "), UserLookup::Id(123));
        assert_eq!(
            parse_user_identifier("alice"),
            UserLookup::Name("alice".to_string())
        );
        // malformed mention falls through to a name lookup
        assert_eq!(
            parse_user_identifier("<@abc>"),
            UserLookup::Name("<@abc>".to_string())
        );
    }

    #[test]
    fn test_channel_identifier_forms() {
        assert_eq!(parse_channel_identifier(""), ChannelLookup::Current);
        assert_eq!(parse_channel_identifier("  "), ChannelLookup::Current);
        assert_eq!(parse_channel_identifier("42"), ChannelLookup::Id(42));
        assert_eq!(parse_channel_identifier("<#42>"), ChannelLookup::Id(42));
        assert_eq!(
            parse_channel_identifier("#general"),
            ChannelLookup::Name("general".to_string())
        );
    }

    #[test]
    fn test_reaction_with_message_id() {
        let target = parse_reaction_input("👍:1234567890123456789");
        assert_eq!(target.emoji, "👍");
        assert_eq!(target.message_id.as_deref(), Some("1234567890123456789"));
        assert_eq!(
            parse_message_id(target.message_id.as_deref().unwrap()),
            Some(1234567890123456789)
        );
    }

    #[test]
    fn test_reaction_emoji_only() {
        let target = parse_reaction_input("👍");
        assert_eq!(target.emoji, "👍");
        assert_eq!(target.message_id, None);

        let trailing = parse_reaction_input("👍:");
        assert_eq!(trailing.message_id, None);
    }

    #[test]
    fn test_reaction_custom_emoji() {
        let target = parse_reaction_input("<:party:998877>:555");
        assert_eq!(target.emoji, "<:party:998877>");
        assert_eq!(target.message_id.as_deref(), Some("555"));

        let alone = parse_reaction_input("<a:wave:1>");
        assert_eq!(alone.emoji, "<a:wave:1>");
        assert_eq!(alone.message_id, None);
    }

    #[test]
    fn test_invalid_message_id() {
        let target = parse_reaction_input("👍:abc");
        assert_eq!(target.message_id.as_deref(), Some("abc"));
        assert_eq!(parse_message_id("abc"), None);
    }
}
