//! Scripted doubles for the model and Discord, shared by unit tests

use crate::ai::{AiResponse, ChatModel, LlmError, Message, ResponseSchema, ToolCall};
use crate::channels::discord_api::{ChannelInfo, DiscordApi, GuildInfo, MemberInfo, PlatformError};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Chat model that replays queued answers and records what it was asked
#[derive(Default)]
pub struct ScriptedModel {
    structured: Mutex<VecDeque<Result<Value, LlmError>>>,
    completions: Mutex<VecDeque<Result<AiResponse, LlmError>>>,
    structured_calls: AtomicUsize,
    completion_calls: AtomicUsize,
    pub seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn approving() -> Self {
        Self::new().with_verdict(json!({"is_valid": true, "reason": "looks fine"}))
    }

    pub fn rejecting(reason: &str) -> Self {
        Self::new().with_verdict(json!({"is_valid": false, "reason": reason}))
    }

    pub fn with_verdict(self, verdict: Value) -> Self {
        self.structured.lock().push_back(Ok(verdict));
        self
    }

    pub fn with_structured_error(self, err: LlmError) -> Self {
        self.structured.lock().push_back(Err(err));
        self
    }

    pub fn with_response(self, response: AiResponse) -> Self {
        self.completions.lock().push_back(Ok(response));
        self
    }

    pub fn with_tool_call(self, id: &str, name: &str, arguments: Value) -> Self {
        self.with_response(AiResponse::tool_use(
            "",
            vec![ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments,
            }],
        ))
    }

    pub fn with_completion_error(self, err: LlmError) -> Self {
        self.completions.lock().push_back(Err(err));
        self
    }

    pub fn structured_count(&self) -> usize {
        self.structured_calls.load(Ordering::SeqCst)
    }

    pub fn completion_count(&self) -> usize {
        self.completion_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<AiResponse, LlmError> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(messages.to_vec());
        self.completions
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(AiResponse::text("done")))
    }

    async fn generate_structured(
        &self,
        messages: &[Message],
        _schema: &ResponseSchema,
    ) -> Result<Value, LlmError> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(messages.to_vec());
        self.structured
            .lock()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

pub fn channel_info(id: u64, name: &str) -> ChannelInfo {
    ChannelInfo {
        id,
        name: name.to_string(),
        kind: "text".to_string(),
        position: Some(0),
        category: Some("General".to_string()),
        topic: None,
        nsfw: false,
        member_count: None,
    }
}

pub fn member_info(id: u64, username: &str, display_name: &str) -> MemberInfo {
    MemberInfo {
        id,
        username: username.to_string(),
        display_name: display_name.to_string(),
        discriminator: None,
        bot: false,
        created_at: "2020-01-01 00:00:00 UTC".to_string(),
        joined_at: Some("2021-01-01 00:00:00 UTC".to_string()),
        roles: vec!["Mod".to_string(), "Member".to_string()],
    }
}

pub fn guild_info(id: u64, name: &str, owner_id: u64) -> GuildInfo {
    GuildInfo {
        id,
        name: name.to_string(),
        description: None,
        owner_id,
        owner_name: Some("owner".to_string()),
        created_at: "2019-05-01 12:00:00 UTC".to_string(),
        member_count: Some(12),
        online_members: Some(4),
        human_members: 10,
        bot_members: 2,
        text_channels: 3,
        voice_channels: 1,
        categories: 1,
        roles: 2,
        emojis: 0,
        boosts: 0,
        boost_level: 0,
        verification_level: "low".to_string(),
    }
}

/// In-memory Discord recording every side effect
#[derive(Default)]
pub struct FakeDiscord {
    pub sent: Mutex<Vec<(u64, String)>>,
    pub dms: Mutex<Vec<(u64, String)>>,
    pub reactions: Mutex<Vec<(u64, u64, String)>>,
    pub deleted: Mutex<Vec<(u64, u64)>>,
    messages: Mutex<HashSet<(u64, u64)>>,
    channels: Mutex<HashMap<u64, (Option<u64>, ChannelInfo)>>,
    members: Mutex<HashMap<(u64, u64), MemberInfo>>,
    guilds: Mutex<HashMap<u64, GuildInfo>>,
    pub fail_sends: AtomicBool,
    pub fail_dms: AtomicBool,
}

impl FakeDiscord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(self, channel_id: u64, message_id: u64) -> Self {
        self.messages.lock().insert((channel_id, message_id));
        self
    }

    pub fn with_channel(self, guild_id: Option<u64>, channel: ChannelInfo) -> Self {
        self.channels.lock().insert(channel.id, (guild_id, channel));
        self
    }

    pub fn with_member(self, guild_id: u64, member: MemberInfo) -> Self {
        self.members.lock().insert((guild_id, member.id), member);
        self
    }

    pub fn with_guild(self, guild: GuildInfo) -> Self {
        self.guilds.lock().insert(guild.id, guild);
        self
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn side_effect_count(&self) -> usize {
        self.sent.lock().len()
            + self.dms.lock().len()
            + self.reactions.lock().len()
            + self.deleted.lock().len()
    }
}

#[async_trait]
impl DiscordApi for FakeDiscord {
    async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), PlatformError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(PlatformError::Http("Missing Permissions".to_string()));
        }
        self.sent.lock().push((channel_id, content.to_string()));
        Ok(())
    }

    async fn send_direct_message(&self, user_id: u64, content: &str) -> Result<(), PlatformError> {
        if self.fail_dms.load(Ordering::SeqCst) {
            return Err(PlatformError::Http("Cannot send messages to this user".to_string()));
        }
        self.dms.lock().push((user_id, content.to_string()));
        Ok(())
    }

    async fn ensure_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError> {
        if self.messages.lock().contains(&(channel_id, message_id)) {
            Ok(())
        } else {
            Err(PlatformError::NotFound("Unknown Message".to_string()))
        }
    }

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> Result<(), PlatformError> {
        // Plain words are not emoji
        if emoji.is_empty() || emoji.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(PlatformError::UnknownEmoji);
        }
        self.reactions
            .lock()
            .push((channel_id, message_id, emoji.to_string()));
        Ok(())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError> {
        self.deleted.lock().push((channel_id, message_id));
        Ok(())
    }

    async fn channel(&self, channel_id: u64) -> Result<ChannelInfo, PlatformError> {
        self.channels
            .lock()
            .get(&channel_id)
            .map(|(_, c)| c.clone())
            .ok_or_else(|| PlatformError::NotFound("Unknown Channel".to_string()))
    }

    async fn guild_channels(&self, guild_id: u64) -> Result<Vec<ChannelInfo>, PlatformError> {
        let mut channels: Vec<ChannelInfo> = self
            .channels
            .lock()
            .values()
            .filter(|(g, _)| *g == Some(guild_id))
            .map(|(_, c)| c.clone())
            .collect();
        channels.sort_by_key(|c| c.id);
        Ok(channels)
    }

    async fn member(&self, guild_id: u64, user_id: u64) -> Result<MemberInfo, PlatformError> {
        self.members
            .lock()
            .get(&(guild_id, user_id))
            .cloned()
            .ok_or_else(|| PlatformError::NotFound("Unknown Member".to_string()))
    }

    async fn find_member(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<MemberInfo>, PlatformError> {
        let members = self.members.lock();
        let in_guild: Vec<&MemberInfo> = members
            .iter()
            .filter(|((g, _), _)| *g == guild_id)
            .map(|(_, m)| m)
            .collect();
        Ok(in_guild
            .iter()
            .find(|m| m.username == name)
            .or_else(|| in_guild.iter().find(|m| m.display_name == name))
            .map(|m| (*m).clone()))
    }

    async fn guild(&self, guild_id: u64) -> Result<GuildInfo, PlatformError> {
        self.guilds
            .lock()
            .get(&guild_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound("Unknown Guild".to_string()))
    }
}
