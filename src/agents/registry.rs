use std::sync::Arc;
use super::agent::Agent;
use super::automation::AutomationAgent;
use super::codegen::CodeGenAgent;
use super::design::DesignAgent;
use super::document::DocumentAgent;

pub const DOCUMENT: &str = "document";
pub const DESIGN: &str = "design";
pub const CODE_GEN: &str = "code-gen";
pub const AUTOMATION: &str = "automation";

pub const BUILTIN_AGENT_TYPES: &[&str] = &[DOCUMENT, DESIGN, CODE_GEN, AUTOMATION];

/// Fresh instances of every built-in agent, ready for `Manager::register_agent`.
pub fn builtin_agents() -> Vec<Arc<dyn Agent>> {
    vec![
        Arc::new(DocumentAgent),
        Arc::new(DesignAgent),
        Arc::new(CodeGenAgent),
        Arc::new(AutomationAgent),
    ]
}

/// Built-in agents restricted to an allow-list of type tags. `None` keeps all of them.
pub fn enabled_agents(allow: Option<&[String]>) -> Vec<Arc<dyn Agent>> {
    builtin_agents()
        .into_iter()
        .filter(|a| allow.map_or(true, |list| list.iter().any(|t| t == a.agent_type())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tags_match_agents() {
        let tags: Vec<String> = builtin_agents().iter().map(|a| a.agent_type().to_string()).collect();
        assert_eq!(tags, BUILTIN_AGENT_TYPES);
    }

    #[test]
    fn test_enabled_agents_filters() {
        let allow = vec![DESIGN.to_string()];
        let agents = enabled_agents(Some(&allow));
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].agent_type(), DESIGN);
        assert_eq!(enabled_agents(None).len(), 4);
    }
}
