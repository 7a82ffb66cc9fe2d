use crate::config::SearchConfig;
use crate::tools::http_retry::is_reqwest_error_retryable;
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
const NO_RESULTS: &str = "No good Google Search Result was found";
const DEFAULT_NUM_RESULTS: u32 = 10;

/// Accept `num_results` as either a number or a numeric string
fn deserialize_u32_lenient<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    match value {
        Some(Value::Number(n)) => Ok(n.as_u64().map(|v| u32::try_from(v).unwrap_or(u32::MAX))),
        Some(Value::String(s)) => Ok(s.parse().ok()),
        _ => Ok(None),
    }
}

struct CacheEntry {
    result: ToolResult,
    expires_at: Instant,
}

struct SearchCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl SearchCache {
    fn new(ttl: Duration) -> Self {
        SearchCache {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn get(&self, key: &str) -> Option<ToolResult> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.result.clone())
    }

    fn set(&self, key: String, result: ToolResult) {
        let mut entries = self.entries.write();
        if entries.len() > 50 {
            let now = Instant::now();
            entries.retain(|_, v| v.expires_at > now);
        }
        entries.insert(
            key,
            CacheEntry {
                result,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}

/// Web search through the Google Custom Search JSON API
pub struct GoogleSearchTool {
    definition: ToolDefinition,
    config: SearchConfig,
    client: reqwest::Client,
    cache: SearchCache,
}

impl GoogleSearchTool {
    pub fn new(config: SearchConfig) -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "query".to_string(),
            PropertySchema::string("The search query"),
        );
        properties.insert(
            "num_results".to_string(),
            PropertySchema {
                schema_type: "integer".to_string(),
                description: "Number of results to use (1-10)".to_string(),
                default: Some(json!(DEFAULT_NUM_RESULTS)),
                enum_values: None,
            },
        );

        GoogleSearchTool {
            definition: ToolDefinition {
                name: "google_search".to_string(),
                description: "Search Google's search API for general web results and information. Does not involve browser interaction.".to_string(),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec!["query".to_string()],
                },
                group: ToolGroup::Web,
            },
            config,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            cache: SearchCache::new(Duration::from_secs(900)),
        }
    }

    async fn search(&self, query: &str, num: u32) -> Result<Value, String> {
        let num = num.to_string();
        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if is_reqwest_error_retryable(&e) {
                    format!("Search request failed (transient): {}", e)
                } else {
                    format!("Search request failed: {}", e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Google Search API error ({}): {}", status, body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| format!("Failed to parse search response: {}", e))
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default, deserialize_with = "deserialize_u32_lenient")]
    num_results: Option<u32>,
}

/// Joins result snippets into one block of text for the model
pub(crate) fn format_results(body: &Value) -> String {
    let snippets: Vec<&str> = body
        .get("items")
        .and_then(|items| items.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("snippet").and_then(|s| s.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if snippets.is_empty() {
        NO_RESULTS.to_string()
    } else {
        snippets.join(" ")
    }
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, _context: &ToolContext) -> ToolResult {
        let params: SearchParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let query = params.query.trim();
        if query.is_empty() {
            return ToolResult::error("Error: Search query cannot be empty");
        }
        let num = params.num_results.unwrap_or(DEFAULT_NUM_RESULTS).clamp(1, 10);

        let cache_key = format!("{}:{}", query, num);
        if let Some(cached) = self.cache.get(&cache_key) {
            log::debug!("[TOOLS] google_search: cached result for '{}'", query);
            return cached;
        }

        log::info!("[TOOLS] google_search: '{}' ({} results)", query, num);
        match self.search(query, num).await {
            Ok(body) => {
                let result = ToolResult::success(format_results(&body));
                self.cache.set(cache_key, result.clone());
                result
            }
            Err(e) => {
                log::warn!("[TOOLS] google_search failed: {}", e);
                ToolResult::error(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> GoogleSearchTool {
        GoogleSearchTool::new(SearchConfig {
            api_key: "key".to_string(),
            engine_id: "cx".to_string(),
        })
    }

    #[test]
    fn test_format_joins_snippets() {
        let body = json!({
            "items": [
                {"title": "Rust", "snippet": "A language empowering everyone."},
                {"title": "No snippet"},
                {"title": "Tokio", "snippet": "An async runtime."}
            ]
        });
        assert_eq!(
            format_results(&body),
            "A language empowering everyone. An async runtime."
        );
    }

    #[test]
    fn test_format_without_items() {
        assert_eq!(format_results(&json!({})), NO_RESULTS);
        assert_eq!(format_results(&json!({"items": []})), NO_RESULTS);
    }

    #[test]
    fn test_cache_expiry() {
        let cache = SearchCache::new(Duration::from_secs(60));
        cache.set("q:10".to_string(), ToolResult::success("hit"));
        assert_eq!(cache.get("q:10").map(|r| r.content), Some("hit".to_string()));
        assert!(cache.get("q:5").is_none());

        let expired = SearchCache::new(Duration::ZERO);
        expired.set("q:10".to_string(), ToolResult::success("stale"));
        assert!(expired.get("q:10").is_none());
    }

    #[tokio::test]
    async fn test_cached_result_skips_request() {
        let tool = tool();
        tool.cache
            .set("rust:3".to_string(), ToolResult::success("cached text"));
        let result = tool
            .execute(json!({"query": " rust ", "num_results": "3"}), &ToolContext::new())
            .await;
        assert_eq!(result.content, "cached text");
    }

    #[tokio::test]
    async fn test_oversized_result_count_is_capped() {
        let tool = tool();
        tool.cache
            .set("rust:10".to_string(), ToolResult::success("ten results"));
        // 2^32 + 1 must not wrap around to 1
        let result = tool
            .execute(json!({"query": "rust", "num_results": 4294967297u64}), &ToolContext::new())
            .await;
        assert_eq!(result.content, "ten results");
    }

    #[tokio::test]
    async fn test_rejects_bad_params() {
        let result = tool().execute(json!({}), &ToolContext::new()).await;
        assert!(result.content.starts_with("Invalid parameters"));

        let result = tool()
            .execute(json!({"query": "   "}), &ToolContext::new())
            .await;
        assert_eq!(result.content, "Error: Search query cannot be empty");
    }

    #[test]
    fn test_definition() {
        let def = tool().definition();
        assert_eq!(def.name, "google_search");
        assert_eq!(def.group, ToolGroup::Web);
        assert_eq!(def.input_schema.required, vec!["query".to_string()]);
    }
}
