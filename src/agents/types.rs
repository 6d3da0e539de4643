use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open-ended, string-keyed payload carried by inputs, outputs and metadata.
///
/// Values are the full JSON value space (string, number, bool, list, map, null),
/// so any agent-specific key set round-trips through the store unchanged.
pub type Payload = serde_json::Map<String, Value>;

/// A file handed to or produced by an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentFile {
    pub name: String,
    /// Location the producing agent assigned to the artifact. Absent on caller-supplied files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub content: String,
    #[serde(default)]
    pub content_type: String,
}

impl AgentFile {
    pub fn new(name: &str, content: impl Into<String>, content_type: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            content: content.into(),
            content_type: content_type.to_string(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Input to a single agent invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentInput {
    /// Free-text instruction.
    pub task: String,
    /// Values carried over from earlier chain steps.
    #[serde(default)]
    pub context: Payload,
    /// Caller-supplied arguments.
    #[serde(default)]
    pub parameters: Payload,
    #[serde(default)]
    pub files: Vec<AgentFile>,
    /// Back-reference to the execution that spawned this one. Lookup only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_execution_id: Option<String>,
}

impl AgentInput {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            ..Default::default()
        }
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn with_file(mut self, file: AgentFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// String items of a list parameter. Non-string items are skipped.
    pub fn param_list(&self, key: &str) -> Option<Vec<&str>> {
        self.parameters
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
    }

    /// Look a key up in parameters first, then in the carried context.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key).or_else(|| self.context.get(key))
    }
}

/// Output of a single agent invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub files: Vec<AgentFile>,
    #[serde(default)]
    pub metadata: Payload,
    /// Empty when `success` is true.
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

impl AgentOutput {
    pub fn succeeded(result: Value) -> Self {
        Self {
            success: true,
            result,
            ..Default::default()
        }
    }

    /// Non-success output describing `error`. Partial output the agent handed
    /// back with the error is kept.
    pub fn failed(error: &crate::errors::AgentrailError) -> Self {
        let mut output = match error {
            crate::errors::AgentrailError::AgentPartial { output, .. } => output.as_ref().clone(),
            _ => Self::default(),
        };
        output.success = false;
        output.error = error.to_string();
        output.metadata.insert(
            "error_type".to_string(),
            Value::String(error.classify().error_type.to_string()),
        );
        output
    }

    pub fn with_file(mut self, file: AgentFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn with_next_step(mut self, step: impl Into<String>) -> Self {
        self.next_steps.push(step.into());
        self
    }

    /// The result as a string-keyed map, when it is one.
    pub fn result_map(&self) -> Option<&Payload> {
        self.result.as_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_helpers() {
        let input = AgentInput::new("write docs")
            .with_parameter("language", "rust")
            .with_parameter("modules", json!(["api", 3, "db"]));

        assert_eq!(input.param_str("language"), Some("rust"));
        assert_eq!(input.param_list("modules"), Some(vec!["api", "db"]));
        assert!(input.param_str("missing").is_none());
    }

    #[test]
    fn test_lookup_prefers_parameters() {
        let input = AgentInput::new("t")
            .with_context("title", "from context")
            .with_parameter("title", "from parameters")
            .with_context("only_ctx", true);

        assert_eq!(input.lookup("title"), Some(&json!("from parameters")));
        assert_eq!(input.lookup("only_ctx"), Some(&json!(true)));
        assert!(input.lookup("nope").is_none());
    }

    #[test]
    fn test_failed_output_carries_error_type() {
        let err = crate::errors::AgentrailError::Validation("task is empty".into());
        let out = AgentOutput::failed(&err);
        assert!(!out.success);
        assert!(out.error.contains("task is empty"));
        assert_eq!(out.metadata["error_type"], "ValidationError");
    }

    #[test]
    fn test_input_deserializes_with_defaults() {
        let input: AgentInput = serde_json::from_value(json!({"task": "t"})).unwrap();
        assert!(input.context.is_empty());
        assert!(input.files.is_empty());
        assert!(input.parent_execution_id.is_none());
    }

    #[test]
    fn test_file_path_omitted_when_absent() {
        let file = AgentFile::new("notes.txt", "hello", "text/plain");
        let value = serde_json::to_value(&file).unwrap();
        assert!(value.get("path").is_none());

        let with_path = file.with_path("out/notes.txt");
        assert_eq!(serde_json::to_value(&with_path).unwrap()["path"], "out/notes.txt");
    }
}
