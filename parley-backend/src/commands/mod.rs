//! Prefix commands: `/instruction <prompt>` and `/search <query>`

use crate::channels::discord_api::DiscordApi;
use crate::channels::types::CommandContext;
use crate::db::Database;
use crate::models::InstructionOutcome;
use std::sync::Arc;

/// A command name and the raw text after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: String,
}

/// Split `"{prefix}name rest of text"`; `None` when the content is not a command
pub fn parse_command(content: &str, prefix: &str) -> Option<ParsedCommand> {
    let body = content.trim().strip_prefix(prefix)?;
    let mut parts = body.splitn(2, char::is_whitespace);
    let name = parts.next().filter(|n| !n.is_empty())?;
    Some(ParsedCommand {
        name: name.to_lowercase(),
        args: parts.next().unwrap_or("").trim().to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Instruction { prompt: String },
    Search { query: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command \"{0}\" is not found")]
    Unknown(String),
    #[error("{0} is a required argument that is missing.")]
    MissingArgument(&'static str),
    #[error("Command can only be used in a server")]
    GuildOnly,
}

impl TryFrom<ParsedCommand> for Command {
    type Error = CommandError;

    fn try_from(parsed: ParsedCommand) -> Result<Self, Self::Error> {
        match parsed.name.as_str() {
            "instruction" if parsed.args.is_empty() => Err(CommandError::MissingArgument("prompt")),
            "instruction" => Ok(Command::Instruction {
                prompt: parsed.args,
            }),
            "search" if parsed.args.is_empty() => Err(CommandError::MissingArgument("query")),
            "search" => Ok(Command::Search { query: parsed.args }),
            _ => Err(CommandError::Unknown(parsed.name)),
        }
    }
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Instruction { .. } => "instruction",
            Command::Search { .. } => "search",
        }
    }
}

pub struct CommandHandler {
    db: Arc<Database>,
}

impl CommandHandler {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn execute(
        &self,
        command: Command,
        ctx: &CommandContext,
        discord: &dyn DiscordApi,
    ) -> Result<(), CommandError> {
        match command {
            Command::Instruction { prompt } => self.instruction(&prompt, ctx, discord).await,
            Command::Search { query } => {
                Self::say(
                    discord,
                    ctx.channel_id,
                    &format!(
                        "The command is currently under development 🛠️.\nYour query was \"{}\".",
                        query
                    ),
                )
                .await;
                Ok(())
            }
        }
    }

    /// Owner-only: set or replace the admin instruction of the current channel
    async fn instruction(
        &self,
        prompt: &str,
        ctx: &CommandContext,
        discord: &dyn DiscordApi,
    ) -> Result<(), CommandError> {
        let guild_id = ctx.guild_id.ok_or(CommandError::GuildOnly)?;
        let guild = match discord.guild(guild_id).await {
            Ok(guild) => guild,
            Err(e) => {
                log::error!("[COMMANDS] Could not load guild {}: {}", guild_id, e);
                return Ok(());
            }
        };

        if ctx.author_id != guild.owner_id {
            Self::say(
                discord,
                ctx.channel_id,
                &format!(
                    "<@{}>, you are not authorized to use this command 😒.",
                    ctx.author_id
                ),
            )
            .await;
            let notice = format!(
                "Unauthorized attempt to use the instruction command by <@{}> in {}.",
                ctx.author_id, guild.name
            );
            if let Err(e) = discord.send_direct_message(guild.owner_id, &notice).await {
                log::error!("[COMMANDS] Error sending DM to guild owner: {}", e);
            }
            return Ok(());
        }

        let channel_name = discord
            .channel(ctx.channel_id)
            .await
            .map(|c| c.name)
            .unwrap_or_else(|_| ctx.channel_id.to_string());

        let outcome = match self.db.upsert_channel_instruction(
            &ctx.channel_id.to_string(),
            prompt,
            &ctx.author_id.to_string(),
        ) {
            Ok(Some(outcome)) => outcome,
            Ok(None) => {
                Self::say(
                    discord,
                    ctx.channel_id,
                    "❌ Channel not found in database. Please make sure the bot has joined this server properly.",
                )
                .await;
                return Ok(());
            }
            Err(e) => {
                log::error!("[COMMANDS] Error managing agent for instruction command: {}", e);
                Self::say(
                    discord,
                    ctx.channel_id,
                    "❌ An error occurred while saving the instruction. Please try again.",
                )
                .await;
                return Ok(());
            }
        };

        log::info!(
            "[COMMANDS] {} agent {} for channel {}",
            if matches!(outcome, InstructionOutcome::Updated(_)) {
                "Updated"
            } else {
                "Created new"
            },
            outcome.agent().id,
            channel_name
        );

        let (confirmation, fallback) = match &outcome {
            InstructionOutcome::Updated(_) => (
                format!(
                    "✅ **Agent Updated** in {} #{}\n**New instruction:** {}",
                    guild.name, channel_name, prompt
                ),
                "✅ Agent instructions updated! (DM failed - check bot permissions)",
            ),
            InstructionOutcome::Created(_) | InstructionOutcome::Relinked(_) => {
                if matches!(outcome, InstructionOutcome::Relinked(_)) {
                    Self::say(
                        discord,
                        ctx.channel_id,
                        "❌ Error: Agent reference is invalid. Creating new agent...",
                    )
                    .await;
                }
                (
                    format!(
                        "✅ **New Agent Created** in {} #{}\n**Instruction:** {}",
                        guild.name, channel_name, prompt
                    ),
                    "✅ New agent created! (DM failed - check bot permissions)",
                )
            }
        };

        // The prompt is only echoed privately; the command message is removed
        let delivered = match discord
            .send_direct_message(guild.owner_id, &confirmation)
            .await
        {
            Ok(()) => match ctx.message_id {
                Some(message_id) => discord
                    .delete_message(ctx.channel_id, message_id)
                    .await
                    .map_err(|e| e.to_string()),
                None => Ok(()),
            },
            Err(e) => Err(e.to_string()),
        };

        if let Err(e) = delivered {
            log::error!("[COMMANDS] Error sending DM to guild owner: {}", e);
            Self::say(discord, ctx.channel_id, fallback).await;
        }
        Ok(())
    }

    async fn say(discord: &dyn DiscordApi, channel_id: u64, text: &str) {
        if let Err(e) = discord.send_message(channel_id, text).await {
            log::error!("[COMMANDS] Failed to reply in {}: {}", channel_id, e);
        }
    }
}
