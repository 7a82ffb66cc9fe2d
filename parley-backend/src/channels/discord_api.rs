//! Discord capability seam.
//!
//! Tools and the dispatcher never touch serenity directly; they talk to a
//! `DiscordApi`. Production uses `SerenityDiscord` over the gateway client's
//! `Http`, tests use an in-memory fake.

use crate::channels::discord::split_message;
use async_trait::async_trait;
use chrono::DateTime;
use serenity::all::{
    ChannelId, ChannelType, GuildChannel, GuildId, Http, Member, MessageId, ReactionType, RoleId,
    Timestamp, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Discord's hard per-message character limit
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("Unknown Emoji")]
    UnknownEmoji,
    #[error("invalid identifier: {0}")]
    InvalidId(String),
    #[error("{0}")]
    Http(String),
}

impl From<serenity::Error> for PlatformError {
    fn from(err: serenity::Error) -> Self {
        PlatformError::classify(&err.to_string())
    }
}

impl PlatformError {
    /// Map a Discord error message onto the variants tools report differently
    pub fn classify(message: &str) -> Self {
        if message.contains("Unknown Emoji") {
            PlatformError::UnknownEmoji
        } else if message.contains("Unknown Message")
            || message.contains("Unknown Channel")
            || message.contains("Unknown Member")
            || message.contains("Unknown User")
            || message.contains("Unknown Guild")
            || message.contains("404")
        {
            PlatformError::NotFound(message.to_string())
        } else {
            PlatformError::Http(message.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: u64,
    pub name: String,
    pub kind: String,
    pub position: Option<u16>,
    pub category: Option<String>,
    pub topic: Option<String>,
    pub nsfw: bool,
    pub member_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub id: u64,
    pub username: String,
    pub display_name: String,
    pub discriminator: Option<u16>,
    pub bot: bool,
    pub created_at: String,
    pub joined_at: Option<String>,
    /// Role names, highest first, without @everyone
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuildInfo {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: u64,
    pub owner_name: Option<String>,
    pub created_at: String,
    pub member_count: Option<u64>,
    pub online_members: Option<u64>,
    pub human_members: usize,
    pub bot_members: usize,
    pub text_channels: usize,
    pub voice_channels: usize,
    pub categories: usize,
    pub roles: usize,
    pub emojis: usize,
    pub boosts: u64,
    pub boost_level: u8,
    pub verification_level: String,
}

/// The Discord operations the bot needs
#[async_trait]
pub trait DiscordApi: Send + Sync {
    async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), PlatformError>;

    async fn send_direct_message(&self, user_id: u64, content: &str) -> Result<(), PlatformError>;

    /// Fails with `NotFound` when the message does not exist in the channel
    async fn ensure_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError>;

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> Result<(), PlatformError>;

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError>;

    async fn channel(&self, channel_id: u64) -> Result<ChannelInfo, PlatformError>;

    async fn guild_channels(&self, guild_id: u64) -> Result<Vec<ChannelInfo>, PlatformError>;

    async fn member(&self, guild_id: u64, user_id: u64) -> Result<MemberInfo, PlatformError>;

    /// Look a member up by username, then by display name
    async fn find_member(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<MemberInfo>, PlatformError>;

    async fn guild(&self, guild_id: u64) -> Result<GuildInfo, PlatformError>;
}

/// Format a Discord timestamp the way the info tools print it
pub fn format_timestamp(ts: &Timestamp) -> String {
    DateTime::from_timestamp(ts.unix_timestamp(), 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn non_zero_id(raw: u64, what: &str) -> Result<u64, PlatformError> {
    if raw == 0 {
        Err(PlatformError::InvalidId(format!("{} id 0", what)))
    } else {
        Ok(raw)
    }
}

/// `DiscordApi` backed by serenity's REST client
pub struct SerenityDiscord {
    http: Arc<Http>,
}

impl SerenityDiscord {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn channel_snapshot(channel: &GuildChannel, category: Option<String>) -> ChannelInfo {
        ChannelInfo {
            id: channel.id.get(),
            name: channel.name.clone(),
            kind: channel.kind.name().to_string(),
            position: Some(channel.position),
            category,
            topic: channel.topic.clone(),
            nsfw: channel.nsfw,
            member_count: channel.member_count.map(u32::from),
        }
    }

    async fn member_snapshot(&self, guild_id: GuildId, member: &Member) -> MemberInfo {
        let role_names = match self.http.get_guild_roles(guild_id).await {
            Ok(roles) => {
                let by_id: HashMap<RoleId, (u16, String)> = roles
                    .into_iter()
                    .map(|r| (r.id, (r.position, r.name)))
                    .collect();
                let mut owned: Vec<(u16, String)> = member
                    .roles
                    .iter()
                    .filter_map(|id| by_id.get(id).cloned())
                    .filter(|(_, name)| name != "@everyone")
                    .collect();
                owned.sort_by(|a, b| b.0.cmp(&a.0));
                owned.into_iter().map(|(_, name)| name).collect()
            }
            Err(e) => {
                log::warn!("[DISCORD] Failed to load roles for guild {}: {}", guild_id, e);
                Vec::new()
            }
        };

        MemberInfo {
            id: member.user.id.get(),
            username: member.user.name.clone(),
            display_name: member.display_name().to_string(),
            discriminator: member.user.discriminator.map(|d| d.get()),
            bot: member.user.bot,
            created_at: format_timestamp(&member.user.id.created_at()),
            joined_at: member.joined_at.as_ref().map(format_timestamp),
            roles: role_names,
        }
    }
}

#[async_trait]
impl DiscordApi for SerenityDiscord {
    async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), PlatformError> {
        let channel = ChannelId::new(non_zero_id(channel_id, "channel")?);
        for chunk in split_message(content, DISCORD_MESSAGE_LIMIT) {
            channel.say(self.http.as_ref(), chunk).await?;
        }
        Ok(())
    }

    async fn send_direct_message(&self, user_id: u64, content: &str) -> Result<(), PlatformError> {
        let user = UserId::new(non_zero_id(user_id, "user")?);
        let dm = user.create_dm_channel(self.http.as_ref()).await?;
        for chunk in split_message(content, DISCORD_MESSAGE_LIMIT) {
            dm.id.say(self.http.as_ref(), chunk).await?;
        }
        Ok(())
    }

    async fn ensure_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError> {
        let channel = ChannelId::new(non_zero_id(channel_id, "channel")?);
        let message = MessageId::new(non_zero_id(message_id, "message")?);
        self.http.get_message(channel, message).await?;
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> Result<(), PlatformError> {
        let channel = ChannelId::new(non_zero_id(channel_id, "channel")?);
        let message = MessageId::new(non_zero_id(message_id, "message")?);
        let reaction =
            ReactionType::try_from(emoji).map_err(|_| PlatformError::UnknownEmoji)?;
        self.http.create_reaction(channel, message, &reaction).await?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError> {
        let channel = ChannelId::new(non_zero_id(channel_id, "channel")?);
        let message = MessageId::new(non_zero_id(message_id, "message")?);
        self.http.delete_message(channel, message, None).await?;
        Ok(())
    }

    async fn channel(&self, channel_id: u64) -> Result<ChannelInfo, PlatformError> {
        let channel_id = ChannelId::new(non_zero_id(channel_id, "channel")?);
        let channel = self.http.get_channel(channel_id).await?;
        match channel.guild() {
            Some(guild_channel) => {
                let category = match guild_channel.parent_id {
                    Some(parent) => self
                        .http
                        .get_channel(parent)
                        .await
                        .ok()
                        .and_then(|c| c.guild())
                        .map(|c| c.name),
                    None => None,
                };
                Ok(Self::channel_snapshot(&guild_channel, category))
            }
            None => Ok(ChannelInfo {
                id: channel_id.get(),
                name: "direct-message".to_string(),
                kind: "private".to_string(),
                position: None,
                category: None,
                topic: None,
                nsfw: false,
                member_count: None,
            }),
        }
    }

    async fn guild_channels(&self, guild_id: u64) -> Result<Vec<ChannelInfo>, PlatformError> {
        let guild_id = GuildId::new(non_zero_id(guild_id, "guild")?);
        let channels = self.http.get_channels(guild_id).await?;
        let categories: HashMap<ChannelId, String> = channels
            .iter()
            .filter(|c| c.kind == ChannelType::Category)
            .map(|c| (c.id, c.name.clone()))
            .collect();
        Ok(channels
            .iter()
            .map(|c| {
                let category = c.parent_id.and_then(|p| categories.get(&p).cloned());
                Self::channel_snapshot(c, category)
            })
            .collect())
    }

    async fn member(&self, guild_id: u64, user_id: u64) -> Result<MemberInfo, PlatformError> {
        let guild_id = GuildId::new(non_zero_id(guild_id, "guild")?);
        let user_id = UserId::new(non_zero_id(user_id, "user")?);
        let member = self.http.get_member(guild_id, user_id).await?;
        Ok(self.member_snapshot(guild_id, &member).await)
    }

    async fn find_member(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<MemberInfo>, PlatformError> {
        let guild_id = GuildId::new(non_zero_id(guild_id, "guild")?);
        // The search endpoint matches username and nickname prefixes
        let candidates = self.http.search_guild_members(guild_id, name, Some(100)).await?;

        let found = candidates
            .iter()
            .find(|m| m.user.name == name)
            .or_else(|| candidates.iter().find(|m| m.display_name() == name));

        match found {
            Some(member) => Ok(Some(self.member_snapshot(guild_id, member).await)),
            None => Ok(None),
        }
    }

    async fn guild(&self, guild_id: u64) -> Result<GuildInfo, PlatformError> {
        let guild_id = GuildId::new(non_zero_id(guild_id, "guild")?);
        let guild = self.http.get_guild_with_counts(guild_id).await?;
        let channels = self.http.get_channels(guild_id).await?;

        let count_kind = |kind: ChannelType| channels.iter().filter(|c| c.kind == kind).count();

        let (human_members, bot_members) =
            match self.http.get_guild_members(guild_id, Some(1000), None).await {
                Ok(members) => {
                    let bots = members.iter().filter(|m| m.user.bot).count();
                    (members.len() - bots, bots)
                }
                Err(e) => {
                    log::warn!("[DISCORD] Failed to list members of {}: {}", guild_id, e);
                    (0, 0)
                }
            };

        let owner_name = self
            .http
            .get_member(guild_id, guild.owner_id)
            .await
            .ok()
            .map(|m| m.display_name().to_string());

        Ok(GuildInfo {
            id: guild_id.get(),
            name: guild.name.clone(),
            description: guild.description.clone(),
            owner_id: guild.owner_id.get(),
            owner_name,
            created_at: format_timestamp(&guild_id.created_at()),
            member_count: guild.approximate_member_count,
            online_members: guild.approximate_presence_count,
            human_members,
            bot_members,
            text_channels: count_kind(ChannelType::Text),
            voice_channels: count_kind(ChannelType::Voice),
            categories: count_kind(ChannelType::Category),
            roles: guild.roles.len().saturating_sub(1),
            emojis: guild.emojis.len(),
            boosts: guild.premium_subscription_count.unwrap_or(0),
            boost_level: u8::from(guild.premium_tier),
            verification_level: format!("{:?}", guild.verification_level).to_lowercase(),
        })
    }
}
