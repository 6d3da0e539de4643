use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use crate::errors::AgentrailError;
use crate::utils::formatting::slugify;
use super::agent::Agent;
use super::registry::DESIGN;
use super::types::{AgentFile, AgentInput, AgentOutput};

/// Produces a component-level design specification. Files passed in
/// (typically the previous step's document) are listed as references.
pub struct DesignAgent;

#[async_trait]
impl Agent for DesignAgent {
    fn agent_type(&self) -> &str {
        DESIGN
    }

    fn name(&self) -> &str {
        "Design Spec Generator"
    }

    fn description(&self) -> &str {
        "Turns requirements into a design specification with named components"
    }

    fn validate(&self, input: &AgentInput) -> Result<(), AgentrailError> {
        if input.task.trim().is_empty() {
            return Err(AgentrailError::Validation("design task must not be empty".into()));
        }
        match input.parameters.get("components") {
            None => Ok(()),
            Some(Value::Array(items)) if items.iter().all(Value::is_string) => Ok(()),
            Some(_) => Err(AgentrailError::Validation(
                "'components' must be a list of component names".into(),
            )),
        }
    }

    async fn run(
        &self,
        _ctx: &CancellationToken,
        input: &AgentInput,
    ) -> Result<AgentOutput, AgentrailError> {
        let title = input
            .lookup("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| input.task.trim().chars().take(60).collect());
        let components = input.param_list("components").unwrap_or_else(|| vec!["core"]);

        let mut spec = format!("# Design: {}\n\n## Goal\n\n{}\n\n## Components\n\n", title, input.task.trim());
        for component in &components {
            spec.push_str(&format!("### {}\n\n- Responsibility: {}\n- Interfaces: TBD during implementation\n\n", component, component));
        }
        if !input.files.is_empty() {
            spec.push_str("## References\n\n");
            for file in &input.files {
                spec.push_str(&format!("- {} ({})\n", file.name, file.content_type));
            }
        }

        let file_name = format!("{}-design.md", slugify(&title));
        let path = format!("designs/{}", file_name);

        let mut output = AgentOutput::succeeded(json!({
            "title": title,
            "components": components,
            "reference_count": input.files.len(),
            "design_path": path,
        }))
        .with_file(AgentFile::new(&file_name, spec, "text/markdown").with_path(path));
        for component in &components {
            output = output.with_next_step(format!("Implement component '{}'", component));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_design_lists_components_and_references() {
        let input = AgentInput::new("Order intake service")
            .with_parameter("components", json!(["api", "storage"]))
            .with_file(AgentFile::new("requirements.md", "# Reqs", "text/markdown"));
        let out = DesignAgent.execute(&CancellationToken::new(), &input).await.unwrap();

        assert_eq!(out.result["components"], json!(["api", "storage"]));
        assert_eq!(out.result["reference_count"], 1);
        let spec = &out.files[0].content;
        assert!(spec.contains("### api"));
        assert!(spec.contains("- requirements.md (text/markdown)"));
        assert_eq!(out.next_steps.len(), 2);
    }

    #[tokio::test]
    async fn test_design_defaults_single_component() {
        let out = DesignAgent
            .execute(&CancellationToken::new(), &AgentInput::new("Cache layer"))
            .await
            .unwrap();
        assert_eq!(out.result["components"], json!(["core"]));
    }

    #[test]
    fn test_design_rejects_non_string_components() {
        let input = AgentInput::new("t").with_parameter("components", json!([1, 2]));
        assert!(matches!(DesignAgent.validate(&input), Err(AgentrailError::Validation(_))));
    }
}
