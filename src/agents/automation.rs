use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use crate::errors::AgentrailError;
use super::agent::Agent;
use super::registry::AUTOMATION;
use super::types::{AgentInput, AgentOutput, Payload};
use tracing::debug;

/// A single automation action, parsed from `verb:argument`.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    /// `set:key=value` publishes `key` in the result map.
    Set { key: String, value: String },
    /// `require:key` fails unless `key` is present in parameters or context.
    Require(String),
    /// `notify:target` records a notification for `target`.
    Notify(String),
    /// `fail:reason` stops the run with `reason`.
    Fail(String),
}

impl Action {
    fn parse(raw: &str) -> Result<Self, AgentrailError> {
        let (verb, arg) = raw
            .split_once(':')
            .ok_or_else(|| AgentrailError::Validation(format!("action '{}' is not in verb:argument form", raw)))?;
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(AgentrailError::Validation(format!("action '{}' has an empty argument", raw)));
        }
        match verb.trim() {
            "set" => {
                let (key, value) = arg
                    .split_once('=')
                    .ok_or_else(|| AgentrailError::Validation(format!("set action '{}' needs key=value", raw)))?;
                Ok(Self::Set { key: key.trim().to_string(), value: value.trim().to_string() })
            }
            "require" => Ok(Self::Require(arg.to_string())),
            "notify" => Ok(Self::Notify(arg.to_string())),
            "fail" => Ok(Self::Fail(arg.to_string())),
            other => Err(AgentrailError::Validation(format!("unknown action verb '{}'", other))),
        }
    }
}

/// Runs a scripted list of actions against the carried context.
pub struct AutomationAgent;

impl AutomationAgent {
    fn report(mut result: Payload, actions_run: usize, notifications: &[String]) -> AgentOutput {
        result.insert("actions_run".to_string(), json!(actions_run));
        result.insert("notifications".to_string(), json!(notifications));
        AgentOutput::succeeded(Value::Object(result))
    }

    /// Stop at action `index`, keeping what the earlier actions produced.
    fn stop(message: String, result: Payload, index: usize, notifications: &[String]) -> AgentrailError {
        AgentrailError::agent_partial(message, Self::report(result, index, notifications))
    }

    fn actions(input: &AgentInput) -> Result<Vec<Action>, AgentrailError> {
        let raw = input
            .parameters
            .get("actions")
            .and_then(Value::as_array)
            .ok_or_else(|| AgentrailError::Validation("missing required list parameter 'actions'".into()))?;
        if raw.is_empty() {
            return Err(AgentrailError::Validation("'actions' must not be empty".into()));
        }
        raw.iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| AgentrailError::Validation("every action must be a string".into()))
                    .and_then(Action::parse)
            })
            .collect()
    }
}

#[async_trait]
impl Agent for AutomationAgent {
    fn agent_type(&self) -> &str {
        AUTOMATION
    }

    fn name(&self) -> &str {
        "Automation Runner"
    }

    fn description(&self) -> &str {
        "Executes scripted set, require, notify and fail actions"
    }

    fn validate(&self, input: &AgentInput) -> Result<(), AgentrailError> {
        Self::actions(input).map(|_| ())
    }

    async fn run(
        &self,
        ctx: &CancellationToken,
        input: &AgentInput,
    ) -> Result<AgentOutput, AgentrailError> {
        let actions = Self::actions(input)?;
        let mut result = Payload::new();
        let mut notifications = Vec::new();

        for (i, action) in actions.iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(AgentrailError::Cancelled(format!("automation stopped before action {}", i)));
            }
            debug!(index = i, action = ?action, "Running automation action");
            match action {
                Action::Set { key, value } => {
                    result.insert(key.clone(), Value::String(value.clone()));
                }
                Action::Require(key) => {
                    if input.lookup(key).is_none() {
                        let message = format!("required value '{}' is missing (action {})", key, i);
                        return Err(Self::stop(message, result, i, &notifications));
                    }
                }
                Action::Notify(target) => notifications.push(target.clone()),
                Action::Fail(reason) => {
                    let message = format!("{} (action {})", reason, i);
                    return Err(Self::stop(message, result, i, &notifications));
                }
            }
        }

        Ok(Self::report(result, actions.len(), &notifications))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_actions(actions: Value) -> AgentInput {
        AgentInput::new("automate").with_parameter("actions", actions)
    }

    #[tokio::test]
    async fn test_automation_set_and_notify() {
        let input = with_actions(json!(["set:ticket=OPS-12", "notify:ops-team"]));
        let out = AutomationAgent.execute(&CancellationToken::new(), &input).await.unwrap();
        assert_eq!(out.result["ticket"], "OPS-12");
        assert_eq!(out.result["actions_run"], 2);
        assert_eq!(out.result["notifications"], json!(["ops-team"]));
    }

    #[tokio::test]
    async fn test_automation_require_reads_context() {
        let input = with_actions(json!(["require:step_0_title"])).with_context("step_0_title", "Spec");
        assert!(AutomationAgent.execute(&CancellationToken::new(), &input).await.is_ok());
    }

    #[tokio::test]
    async fn test_automation_require_missing_fails() {
        let input = with_actions(json!(["require:approval"]));
        let err = AutomationAgent.execute(&CancellationToken::new(), &input).await.unwrap_err();
        assert!(matches!(err, AgentrailError::AgentPartial { .. }));
        assert!(err.to_string().contains("approval"));
    }

    #[tokio::test]
    async fn test_automation_fail_action() {
        let input = with_actions(json!(["notify:ops", "fail:deploy window closed"]));
        let err = AutomationAgent.execute(&CancellationToken::new(), &input).await.unwrap_err();
        assert_eq!(err.to_string(), "Agent error: deploy window closed (action 1)");
    }

    #[tokio::test]
    async fn test_automation_failure_keeps_earlier_work() {
        let input = with_actions(json!(["set:ticket=OPS-7", "notify:ops", "fail:freeze"]));
        let err = AutomationAgent.execute(&CancellationToken::new(), &input).await.unwrap_err();

        let out = AgentOutput::failed(&err);
        assert!(!out.success);
        assert_eq!(out.error, "Agent error: freeze (action 2)");
        assert_eq!(out.metadata["error_type"], "AgentError");
        assert_eq!(out.result["ticket"], "OPS-7");
        assert_eq!(out.result["actions_run"], 2);
        assert_eq!(out.result["notifications"], json!(["ops"]));
    }

    #[test]
    fn test_automation_validation() {
        assert!(AutomationAgent.validate(&AgentInput::new("t")).is_err());
        assert!(AutomationAgent.validate(&with_actions(json!([]))).is_err());
        assert!(AutomationAgent.validate(&with_actions(json!(["launch:rocket"]))).is_err());
        assert!(AutomationAgent.validate(&with_actions(json!(["set:novalue"]))).is_err());
        assert!(AutomationAgent.validate(&with_actions(json!([42]))).is_err());
        assert!(AutomationAgent.validate(&with_actions(json!(["set:a=b"]))).is_ok());
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(
            Action::parse("set: env = prod").unwrap(),
            Action::Set { key: "env".into(), value: "prod".into() }
        );
        assert_eq!(Action::parse("notify:sales").unwrap(), Action::Notify("sales".into()));
    }
}
