use serde::{Deserialize, Serialize};

/// Context of a plain guild/DM message that mentioned the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    pub message_id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub author_id: u64,
}

/// Context of a prefix command invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub author_id: u64,
    /// The message carrying the command, when it has not been deleted
    pub message_id: Option<u64>,
}

/// What triggered an agent run. Tools only see it through the capability traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InvocationContext {
    Message(MessageContext),
    Command(CommandContext),
}

pub trait HasChannel {
    fn channel_id(&self) -> u64;
}

pub trait HasGuild {
    fn guild_id(&self) -> Option<u64>;
}

pub trait HasMessage {
    fn message_id(&self) -> Option<u64>;
}

impl HasChannel for MessageContext {
    fn channel_id(&self) -> u64 {
        self.channel_id
    }
}

impl HasGuild for MessageContext {
    fn guild_id(&self) -> Option<u64> {
        self.guild_id
    }
}

impl HasMessage for MessageContext {
    fn message_id(&self) -> Option<u64> {
        Some(self.message_id)
    }
}

impl HasChannel for CommandContext {
    fn channel_id(&self) -> u64 {
        self.channel_id
    }
}

impl HasGuild for CommandContext {
    fn guild_id(&self) -> Option<u64> {
        self.guild_id
    }
}

impl HasMessage for CommandContext {
    fn message_id(&self) -> Option<u64> {
        self.message_id
    }
}

impl HasChannel for InvocationContext {
    fn channel_id(&self) -> u64 {
        match self {
            InvocationContext::Message(ctx) => ctx.channel_id(),
            InvocationContext::Command(ctx) => ctx.channel_id(),
        }
    }
}

impl HasGuild for InvocationContext {
    fn guild_id(&self) -> Option<u64> {
        match self {
            InvocationContext::Message(ctx) => ctx.guild_id(),
            InvocationContext::Command(ctx) => ctx.guild_id(),
        }
    }
}

impl HasMessage for InvocationContext {
    fn message_id(&self) -> Option<u64> {
        match self {
            InvocationContext::Message(ctx) => ctx.message_id(),
            InvocationContext::Command(ctx) => ctx.message_id(),
        }
    }
}

/// Platform-neutral view of an inbound Discord message
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message_id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub author_id: u64,
    pub author_name: String,
    pub author_is_bot: bool,
    pub guild_name: Option<String>,
    pub channel_name: Option<String>,
    pub content: String,
    /// User ids mentioned in the message
    pub mentions: Vec<u64>,
}

impl InboundMessage {
    pub fn message_context(&self) -> MessageContext {
        MessageContext {
            message_id: self.message_id,
            channel_id: self.channel_id,
            guild_id: self.guild_id,
            author_id: self.author_id,
        }
    }

    pub fn command_context(&self) -> CommandContext {
        CommandContext {
            channel_id: self.channel_id,
            guild_id: self.guild_id,
            author_id: self.author_id,
            message_id: Some(self.message_id),
        }
    }
}

/// Outcome of handling one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// Bot author or empty content
    Ignored,
    /// Stored without a reply
    Persisted,
    /// Mention without a request; replied with a greeting
    Greeted,
    /// A prefix command ran
    Command(String),
    /// The agent graph ran and produced this output
    Agent(String),
    /// The agent failed; the generic apology was sent
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_dispatch_over_variants() {
        let message = InvocationContext::Message(MessageContext {
            message_id: 10,
            channel_id: 20,
            guild_id: Some(30),
            author_id: 40,
        });
        assert_eq!(message.channel_id(), 20);
        assert_eq!(message.guild_id(), Some(30));
        assert_eq!(message.message_id(), Some(10));

        let command = InvocationContext::Command(CommandContext {
            channel_id: 21,
            guild_id: None,
            author_id: 41,
            message_id: None,
        });
        assert_eq!(command.channel_id(), 21);
        assert_eq!(command.guild_id(), None);
        assert_eq!(command.message_id(), None);
    }
}
