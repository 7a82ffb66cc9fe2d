use crate::ai::factory::{create_agent, AgentOptions};
use crate::ai::ChatModel;
use crate::channels::discord_api::DiscordApi;
use crate::channels::types::{DispatchResult, InboundMessage, InvocationContext};
use crate::commands::{parse_command, Command, CommandHandler, ParsedCommand};
use crate::db::Database;
use crate::models::NewMessage;
use crate::tools::Tool;
use std::sync::Arc;

const APOLOGY: &str = "Sorry, an error occurred while processing your message.";

/// Where an inbound message goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundRoute {
    Ignore,
    Command(ParsedCommand),
    /// Mentioned with nothing to do
    Greet,
    /// Mentioned with a request; the mention is already stripped
    Agent(String),
    Persist,
}

fn strip_mentions(content: &str, bot_id: u64) -> String {
    content
        .replace(&format!("<@!{}>", bot_id), "")
        .replace(&format!("<@{}>", bot_id), "")
        .trim()
        .to_string()
}

/// Classify a message. Commands take precedence over mentions.
pub fn route_inbound(msg: &InboundMessage, bot_id: Option<u64>, prefix: &str) -> InboundRoute {
    if msg.author_is_bot || msg.content.trim().is_empty() {
        return InboundRoute::Ignore;
    }

    if let Some(parsed) = parse_command(&msg.content, prefix) {
        return InboundRoute::Command(parsed);
    }

    let Some(bot_id) = bot_id else {
        return InboundRoute::Persist;
    };
    let mentioned = msg.mentions.contains(&bot_id)
        || msg.content.contains(&format!("<@{}>", bot_id))
        || msg.content.contains(&format!("<@!{}>", bot_id));
    if !mentioned {
        return InboundRoute::Persist;
    }

    let request = strip_mentions(&msg.content, bot_id);
    if request.is_empty() || request.eq_ignore_ascii_case("hello") {
        InboundRoute::Greet
    } else {
        InboundRoute::Agent(request)
    }
}

/// Routes Discord messages to commands, greetings or the agent graph
pub struct MessageDispatcher {
    db: Arc<Database>,
    llm: Arc<dyn ChatModel>,
    commands: CommandHandler,
    extra_tools: Vec<Arc<dyn Tool>>,
    options: AgentOptions,
    prefix: String,
}

impl MessageDispatcher {
    pub fn new(db: Arc<Database>, llm: Arc<dyn ChatModel>, options: AgentOptions) -> Self {
        Self {
            commands: CommandHandler::new(db.clone()),
            db,
            llm,
            extra_tools: Vec::new(),
            options,
            prefix: "/".to_string(),
        }
    }

    /// Tools registered ahead of the base set on every agent, e.g. web search
    pub fn with_extra_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.extra_tools = tools;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    pub async fn handle(
        &self,
        msg: &InboundMessage,
        bot_id: Option<u64>,
        discord: Arc<dyn DiscordApi>,
    ) -> DispatchResult {
        match route_inbound(msg, bot_id, &self.prefix) {
            InboundRoute::Ignore => DispatchResult::Ignored,
            InboundRoute::Persist => {
                self.persist(msg);
                DispatchResult::Persisted
            }
            InboundRoute::Greet => {
                let greeting = format!("Hello @{}!", msg.author_name);
                if let Err(e) = discord.send_message(msg.channel_id, &greeting).await {
                    log::error!("[DISCORD] Failed to send greeting: {}", e);
                }
                DispatchResult::Greeted
            }
            InboundRoute::Command(parsed) => {
                self.persist(msg);
                let name = parsed.name.clone();
                match Command::try_from(parsed) {
                    Ok(command) => {
                        log::info!(
                            "[DISCORD] /{} from {} in {}",
                            command.name(),
                            msg.author_name,
                            msg.channel_id
                        );
                        if let Err(e) = self
                            .commands
                            .execute(command, &msg.command_context(), discord.as_ref())
                            .await
                        {
                            log::warn!("[DISCORD] Command /{} failed: {}", name, e);
                        }
                    }
                    Err(e) => log::warn!("[DISCORD] {}", e),
                }
                DispatchResult::Command(name)
            }
            InboundRoute::Agent(request) => self.run_agent(msg, &request, discord).await,
        }
    }

    async fn run_agent(
        &self,
        msg: &InboundMessage,
        request: &str,
        discord: Arc<dyn DiscordApi>,
    ) -> DispatchResult {
        self.persist(msg);

        let instruction = self.admin_instruction(msg);
        let agent = create_agent(
            self.llm.clone(),
            self.extra_tools.clone(),
            Some(InvocationContext::Message(msg.message_context())),
            Some(discord.clone()),
            self.options.clone(),
        );

        let user_id = msg.author_id.to_string();
        match agent.invoke(request, &instruction, Some(&user_id)).await {
            Ok(output) => {
                log::debug!(
                    "[DISCORD] Agent finished (approved={}): {}",
                    output.approved,
                    output.text
                );
                DispatchResult::Agent(output.text)
            }
            Err(e) => {
                log::error!("[DISCORD] Error handling message: {}", e);
                if let Err(send_err) = discord.send_message(msg.channel_id, APOLOGY).await {
                    log::error!("[DISCORD] Error sending error message: {}", send_err);
                }
                DispatchResult::Failed(e.to_string())
            }
        }
    }

    fn admin_instruction(&self, msg: &InboundMessage) -> String {
        let Some(guild_id) = msg.guild_id else {
            return String::new();
        };
        self.db
            .get_channel_instruction(&guild_id.to_string(), &msg.channel_id.to_string())
            .unwrap_or_else(|e| {
                log::error!(
                    "[DISCORD] Error retrieving admin instruction for guild {}: {}",
                    guild_id,
                    e
                );
                String::new()
            })
    }

    /// Store the author and, for guild messages, the message itself. Failures are logged.
    fn persist(&self, msg: &InboundMessage) {
        let author_id = msg.author_id.to_string();
        let user = match self.db.get_or_create_user(&author_id, Some(&msg.author_name)) {
            Ok(user) => user,
            Err(e) => {
                log::error!("[DISCORD] Error saving user to database: {}", e);
                return;
            }
        };

        // DMs have no guild or channel row
        let Some(guild_id) = msg.guild_id else {
            return;
        };

        let channel = match self.db.get_or_create_channel(
            &guild_id.to_string(),
            msg.guild_name.as_deref(),
            &msg.channel_id.to_string(),
            msg.channel_name.as_deref(),
        ) {
            Ok(channel) => channel,
            Err(e) => {
                log::error!("[DISCORD] Error saving channel to database: {}", e);
                return;
            }
        };

        let message_id = msg.message_id.to_string();
        match self.db.save_message(&NewMessage {
            discord_message_id: &message_id,
            discord_user_id: &author_id,
            content: &msg.content,
            channel_id: &channel.id,
            user_id: &user.id,
        }) {
            Ok(_) => log::info!(
                "[DISCORD] Saved message from {} in channel {}",
                msg.author_name,
                msg.channel_name.as_deref().unwrap_or(&channel.discord_channel_id)
            ),
            Err(e) => log::error!("[DISCORD] Error saving message to database: {}", e),
        }
    }
}
