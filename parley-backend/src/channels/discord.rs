use crate::channels::discord_api::{DiscordApi, SerenityDiscord};
use crate::channels::dispatcher::MessageDispatcher;
use crate::channels::types::{DispatchResult, InboundMessage};
use crate::channels::DiscordStatus;
use serenity::all::{
    ChannelType, Client, Context, EventHandler, GatewayIntents, Guild, Message, Ready,
};
use std::sync::Arc;
use tokio::sync::oneshot;

struct DiscordHandler {
    dispatcher: Arc<MessageDispatcher>,
    status: Arc<DiscordStatus>,
}

impl DiscordHandler {
    fn inbound(ctx: &Context, msg: &Message) -> InboundMessage {
        // Names come from the cache; the guild ref must not live across an await
        let (guild_name, channel_name) = match msg.guild(&ctx.cache) {
            Some(guild) => (
                Some(guild.name.clone()),
                guild.channels.get(&msg.channel_id).map(|c| c.name.clone()),
            ),
            None => (None, None),
        };

        InboundMessage {
            message_id: msg.id.get(),
            channel_id: msg.channel_id.get(),
            guild_id: msg.guild_id.map(|g| g.get()),
            author_id: msg.author.id.get(),
            author_name: msg.author.name.clone(),
            author_is_bot: msg.author.bot,
            guild_name,
            channel_name,
            content: msg.content.clone(),
            mentions: msg.mentions.iter().map(|u| u.id.get()).collect(),
        }
    }
}

#[serenity::async_trait]
impl EventHandler for DiscordHandler {
    async fn message(&self, ctx: Context, msg: Message) {
        let inbound = Self::inbound(&ctx, &msg);
        let discord: Arc<dyn DiscordApi> = Arc::new(SerenityDiscord::new(ctx.http.clone()));

        let result = self
            .dispatcher
            .handle(&inbound, self.status.bot_id(), discord)
            .await;

        match result {
            DispatchResult::Ignored | DispatchResult::Persisted => {}
            other => log::debug!("[DISCORD] Message {} handled: {:?}", inbound.message_id, other),
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        log::info!(
            "[DISCORD] We have logged in as {} ({})",
            ready.user.name,
            ready.user.id
        );
        self.status.mark_ready(ready.user.id.get());
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, is_new: Option<bool>) {
        if is_new == Some(true) {
            log::info!("[DISCORD] Joined server: {} (ID: {})", guild.name, guild.id);
        }

        let text_channels: Vec<(String, String)> = guild
            .channels
            .values()
            .filter(|c| c.kind == ChannelType::Text)
            .map(|c| (c.id.get().to_string(), c.name.clone()))
            .collect();

        if let Err(e) = self.dispatcher.db().record_guild(
            &guild.id.get().to_string(),
            &guild.name,
            &text_channels,
        ) {
            log::error!(
                "[DISCORD] Error saving guild and channels to database: {}",
                e
            );
        }
    }
}

/// Split text into chunks of at most `max_chars` characters, preferring line breaks
pub(crate) fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            if line_len > max_chars {
                let chars: Vec<char> = line.chars().collect();
                let mut pieces: Vec<String> = chars
                    .chunks(max_chars)
                    .map(|piece| piece.iter().collect())
                    .collect();
                current = pieces.pop().unwrap_or_default();
                current_len = current.chars().count();
                chunks.extend(pieces);
            } else {
                current = line.to_string();
                current_len = line_len;
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Connect to the gateway and dispatch events until shutdown
pub async fn start_discord_listener(
    bot_token: String,
    dispatcher: Arc<MessageDispatcher>,
    status: Arc<DiscordStatus>,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), String> {
    log::info!("[DISCORD] Starting listener");

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    let handler = DiscordHandler {
        dispatcher,
        status: status.clone(),
    };

    let mut client = Client::builder(&bot_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| format!("Failed to create Discord client: {}", e))?;

    let shard_manager = client.shard_manager.clone();

    let outcome = tokio::select! {
        _ = &mut shutdown_rx => {
            log::info!("[DISCORD] Listener received shutdown signal");
            shard_manager.shutdown_all().await;
            Ok(())
        }
        result = client.start() => {
            match result {
                Ok(()) => {
                    log::info!("[DISCORD] Listener stopped");
                    Ok(())
                }
                Err(e) => {
                    let error = format!("Discord client error: {}", e);
                    log::error!("[DISCORD] {}", error);
                    Err(error)
                }
            }
        }
    };

    status.mark_disconnected();
    outcome
}
