use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use crate::errors::AgentrailError;
use crate::utils::formatting::slugify;
use super::agent::Agent;
use super::registry::DOCUMENT;
use super::types::{AgentFile, AgentInput, AgentOutput};
use tracing::debug;

const DEFAULT_SECTIONS: &[&str] = &["Overview", "Details", "Next Steps"];
const SUPPORTED_FORMATS: &[&str] = &["markdown", "text"];

/// Renders a structured document from the task and carried context.
pub struct DocumentAgent;

impl DocumentAgent {
    fn title(input: &AgentInput) -> String {
        match input.lookup("title").and_then(Value::as_str) {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => input.task.trim().chars().take(60).collect(),
        }
    }

    fn render(input: &AgentInput, title: &str, sections: &[&str], markdown: bool) -> String {
        let mut doc = String::new();
        if markdown {
            doc.push_str(&format!("# {}\n\n", title));
        } else {
            doc.push_str(&format!("{}\n{}\n\n", title, "=".repeat(title.len())));
        }

        for section in sections {
            if markdown {
                doc.push_str(&format!("## {}\n\n", section));
            } else {
                doc.push_str(&format!("{}\n\n", section.to_uppercase()));
            }
            doc.push_str(&format!("{}\n\n", input.task.trim()));
        }

        if !input.context.is_empty() {
            doc.push_str(if markdown { "## Context\n\n" } else { "CONTEXT\n\n" });
            for (key, value) in &input.context {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                doc.push_str(&format!("- {}: {}\n", key, rendered));
            }
            doc.push('\n');
        }
        doc
    }
}

#[async_trait]
impl Agent for DocumentAgent {
    fn agent_type(&self) -> &str {
        DOCUMENT
    }

    fn name(&self) -> &str {
        "Document Generator"
    }

    fn description(&self) -> &str {
        "Generates a sectioned document from a task description and prior step context"
    }

    fn validate(&self, input: &AgentInput) -> Result<(), AgentrailError> {
        if input.task.trim().is_empty() {
            return Err(AgentrailError::Validation("document task must not be empty".into()));
        }
        if let Some(format) = input.param_str("format") {
            if !SUPPORTED_FORMATS.contains(&format) {
                return Err(AgentrailError::Validation(format!(
                    "unsupported document format '{}', expected one of {:?}",
                    format, SUPPORTED_FORMATS
                )));
            }
        }
        if let Some(sections) = input.parameters.get("sections") {
            if !sections.is_array() {
                return Err(AgentrailError::Validation("'sections' must be a list".into()));
            }
        }
        Ok(())
    }

    async fn run(
        &self,
        _ctx: &CancellationToken,
        input: &AgentInput,
    ) -> Result<AgentOutput, AgentrailError> {
        let title = Self::title(input);
        let markdown = input.param_str("format").unwrap_or("markdown") == "markdown";
        let sections = match input.param_list("sections") {
            Some(list) if !list.is_empty() => list,
            _ => DEFAULT_SECTIONS.to_vec(),
        };

        let content = Self::render(input, &title, &sections, markdown);
        let (ext, content_type) = if markdown { ("md", "text/markdown") } else { ("txt", "text/plain") };
        let file_name = format!("{}.{}", slugify(&title), ext);
        let path = format!("documents/{}", file_name);
        let word_count = content.split_whitespace().count();
        debug!(title = %title, word_count, "Rendered document");

        Ok(AgentOutput::succeeded(json!({
            "title": title,
            "sections": sections.len(),
            "word_count": word_count,
            "document_path": path,
        }))
        .with_file(AgentFile::new(&file_name, content, content_type).with_path(path))
        .with_next_step("Review the generated document"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_document_uses_title_parameter() {
        let input = AgentInput::new("Describe the billing flow")
            .with_parameter("title", "Billing Flow")
            .with_parameter("sections", json!(["Summary"]));
        let out = DocumentAgent.execute(&CancellationToken::new(), &input).await.unwrap();

        assert!(out.success);
        assert_eq!(out.result["title"], "Billing Flow");
        assert_eq!(out.result["sections"], 1);
        assert_eq!(out.files.len(), 1);
        assert_eq!(out.files[0].name, "billing-flow.md");
        assert_eq!(out.files[0].path.as_deref(), Some("documents/billing-flow.md"));
        assert!(out.files[0].content.contains("## Summary"));
    }

    #[tokio::test]
    async fn test_document_renders_context() {
        let input = AgentInput::new("Summarize").with_context("step_0_title", "Spec");
        let out = DocumentAgent.execute(&CancellationToken::new(), &input).await.unwrap();
        assert!(out.files[0].content.contains("- step_0_title: Spec"));
    }

    #[tokio::test]
    async fn test_document_plain_text_format() {
        let input = AgentInput::new("Notes").with_parameter("format", "text");
        let out = DocumentAgent.execute(&CancellationToken::new(), &input).await.unwrap();
        assert_eq!(out.files[0].content_type, "text/plain");
        assert!(out.files[0].name.ends_with(".txt"));
    }

    #[tokio::test]
    async fn test_document_rejects_empty_task() {
        let err = DocumentAgent
            .execute(&CancellationToken::new(), &AgentInput::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentrailError::Validation(_)));
    }

    #[test]
    fn test_document_rejects_unknown_format() {
        let input = AgentInput::new("t").with_parameter("format", "pdf");
        assert!(DocumentAgent.validate(&input).is_err());
    }
}
