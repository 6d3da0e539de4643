use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::agents::Payload;
use crate::tracker::execution_tracker::now;

/// One step of a chain: which agent to run and how to feed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentChainStep {
    #[serde(default)]
    pub order: u32,
    pub agent_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Target parameter name -> source key in the running context.
    #[serde(default)]
    pub input_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub parameters: Payload,
    #[serde(default)]
    pub continue_on_fail: bool,
}

impl AgentChainStep {
    pub fn new(agent_type: &str) -> Self {
        Self {
            order: 0,
            agent_type: agent_type.to_string(),
            name: agent_type.to_string(),
            description: String::new(),
            input_mapping: BTreeMap::new(),
            parameters: Payload::new(),
            continue_on_fail: false,
        }
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn map_input(mut self, target: &str, source: &str) -> Self {
        self.input_mapping.insert(target.to_string(), source.to_string());
        self
    }

    pub fn continue_on_fail(mut self, tolerate: bool) -> Self {
        self.continue_on_fail = tolerate;
        self
    }
}

/// A named, ordered sequence of agent steps. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentChain {
    /// Assigned on creation when left empty.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<AgentChainStep>,
    #[serde(default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,
}

impl AgentChain {
    /// A chain whose steps run in the given order.
    pub fn new(name: &str, steps: Vec<AgentChainStep>) -> Self {
        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| AgentChainStep { order: i as u32, ..step })
            .collect();
        let created = now();
        Self {
            id: String::new(),
            name: name.to_string(),
            description: String::new(),
            steps,
            created_at: created,
            updated_at: created,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_numbers_steps() {
        let chain = AgentChain::new("docs", vec![AgentChainStep::new("document"), AgentChainStep::new("design")])
            .with_description("requirements to design");
        assert_eq!(chain.description, "requirements to design");
        let orders: Vec<u32> = chain.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert!(chain.id.is_empty());
        assert_eq!(chain.created_at, chain.updated_at);
    }

    #[test]
    fn test_step_deserializes_with_defaults() {
        let step: AgentChainStep = serde_json::from_value(json!({"agent_type": "code-gen"})).unwrap();
        assert_eq!(step.agent_type, "code-gen");
        assert!(!step.continue_on_fail);
        assert!(step.input_mapping.is_empty());
        assert!(step.parameters.is_empty());
    }

    #[test]
    fn test_step_builders() {
        let step = AgentChainStep::new("code-gen")
            .with_parameter("language", "rust")
            .map_input("title", "step_0_title")
            .continue_on_fail(true);
        assert_eq!(step.parameters["language"], "rust");
        assert_eq!(step.input_mapping["title"], "step_0_title");
        assert!(step.continue_on_fail);
    }
}
