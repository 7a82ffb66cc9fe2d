use crate::ai::graph::OutputMode;
use std::env;

pub const DEFAULT_LLM_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_STEPS: u32 = 10;

/// Settings for the shared chat model handle
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 0.0,
            max_retries: 2,
            timeout_secs: 120,
        }
    }
}

/// Google Custom Search credentials for the web search tool
#[derive(Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub engine_id: String,
}

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub port: u16,
    pub database_url: String,
    pub llm: LlmConfig,
    /// Web search is only offered to the agent when credentials exist
    pub search: Option<SearchConfig>,
    pub output_mode: OutputMode,
    pub max_steps: u32,
    pub command_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or("DISCORD_TOKEN must be set")?;
        let api_key = get("LLM_API_KEY")
            .or_else(|| get("GEMINI_API_KEY"))
            .ok_or("GEMINI_API_KEY (or LLM_API_KEY) must be set")?;

        let port = match get("PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| format!("PORT must be a valid number, got '{}'", p))?,
            None => 8080,
        };

        let max_retries = match get("LLM_MAX_RETRIES") {
            Some(v) => v
                .parse()
                .map_err(|_| format!("LLM_MAX_RETRIES must be a number, got '{}'", v))?,
            None => 2,
        };

        let max_steps = match get("AGENT_MAX_STEPS") {
            Some(v) => v
                .parse()
                .map_err(|_| format!("AGENT_MAX_STEPS must be a number, got '{}'", v))?,
            None => DEFAULT_MAX_STEPS,
        };

        let output_mode = match get("AGENT_OUTPUT_MODE") {
            Some(v) => v
                .parse::<OutputMode>()
                .map_err(|_| format!("Unknown AGENT_OUTPUT_MODE '{}'", v))?,
            None => OutputMode::default(),
        };

        let search_key = get("GOOGLE_API_KEY").or_else(|| get("GEMINI_API_KEY"));
        let search_engine = get("GOOGLE_CSE_ID").or_else(|| get("GOOGLE_CLIENT_SECRET"));
        let search = match (search_key, search_engine) {
            (Some(api_key), Some(engine_id)) => Some(SearchConfig { api_key, engine_id }),
            _ => None,
        };

        Ok(Self {
            discord_token,
            port,
            database_url: get("DATABASE_URL").unwrap_or_else(|| "./.db/parley.db".to_string()),
            llm: LlmConfig {
                api_key,
                endpoint: get("LLM_ENDPOINT").unwrap_or_else(|| DEFAULT_LLM_ENDPOINT.to_string()),
                model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
                max_retries,
                ..LlmConfig::default()
            },
            search,
            output_mode,
            max_steps,
            command_prefix: get("COMMAND_PREFIX").unwrap_or_else(|| "/".to_string()),
        })
    }
}
