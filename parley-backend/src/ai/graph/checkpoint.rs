use crate::ai::graph::types::{AgentState, GraphNode};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Checkpoint key for a user's conversation thread
pub fn thread_id_for(user_id: Option<&str>) -> String {
    match user_id.filter(|id| !id.is_empty()) {
        Some(id) => format!("user_{}", id),
        None => "user_unknown".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub state: AgentState,
    /// Node that produced this state
    pub node: GraphNode,
    pub saved_at: DateTime<Utc>,
}

/// Process-local checkpoint store; lost on restart
#[derive(Default)]
pub struct InMemoryCheckpointer {
    threads: DashMap<String, Checkpoint>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, thread_id: &str, node: GraphNode, state: &AgentState) {
        log::debug!(
            "[CHECKPOINT] {} after {} ({} messages)",
            thread_id,
            node,
            state.messages.len()
        );
        self.threads.insert(
            thread_id.to_string(),
            Checkpoint {
                state: state.clone(),
                node,
                saved_at: Utc::now(),
            },
        );
    }

    pub fn latest(&self, thread_id: &str) -> Option<Checkpoint> {
        self.threads.get(thread_id).map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_ids() {
        assert_eq!(thread_id_for(Some("42")), "user_42");
        assert_eq!(thread_id_for(None), "user_unknown");
        assert_eq!(thread_id_for(Some("")), "user_unknown");
    }

    #[test]
    fn test_latest_checkpoint_wins() {
        let store = InMemoryCheckpointer::new();
        let mut state = AgentState::new("q", "", Some("1".into()), 10);
        store.put("user_1", GraphNode::ValidateTask, &state);

        state.remaining_steps = 3;
        store.put("user_1", GraphNode::ExecuteTask, &state);

        let latest = store.latest("user_1").unwrap();
        assert_eq!(latest.node, GraphNode::ExecuteTask);
        assert_eq!(latest.state.remaining_steps, 3);
        assert!(store.latest("user_2").is_none());
    }
}
