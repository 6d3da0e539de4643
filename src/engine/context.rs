use crate::agents::{AgentInput, AgentOutput, Payload};
use crate::tracker::AgentExecution;
use super::chain::AgentChainStep;

/// Key under which step `index` publishes `key` to later steps.
pub fn step_key(index: usize, key: &str) -> String {
    format!("step_{}_{}", index, key)
}

/// Input for one chain step.
///
/// The task and files come from `current`, the context is the running context,
/// and the step's declared parameters are overlaid by its input mapping.
/// A mapping whose source key is not in the running context is skipped.
pub fn build_step_input(
    step: &AgentChainStep,
    current: &AgentInput,
    running_context: &Payload,
    chain_execution_id: &str,
) -> AgentInput {
    let mut parameters = step.parameters.clone();
    for (target, source) in &step.input_mapping {
        if let Some(value) = running_context.get(source) {
            parameters.insert(target.clone(), value.clone());
        }
    }
    AgentInput {
        task: current.task.clone(),
        context: running_context.clone(),
        parameters,
        files: current.files.clone(),
        parent_execution_id: Some(chain_execution_id.to_string()),
    }
}

/// Fold a finished step's output into the state carried to the next step.
///
/// Map results are merged under `step_<index>_<key>`. Output files, when there
/// are any, replace the carried files outright.
pub fn absorb_step_output(
    running_context: &mut Payload,
    current: &mut AgentInput,
    index: usize,
    output: Option<&AgentOutput>,
) {
    let Some(output) = output else { return };
    if let Some(result) = output.result_map() {
        for (key, value) in result {
            running_context.insert(step_key(index, key), value.clone());
        }
    }
    if !output.files.is_empty() {
        current.files = output.files.clone();
    }
}

/// Rebuild the carried state of a chain run from its recorded step snapshots.
pub fn replay(initial: &AgentInput, steps: &[AgentExecution]) -> (Payload, AgentInput) {
    let mut running_context = Payload::new();
    let mut current = initial.clone();
    for (index, execution) in steps.iter().enumerate() {
        absorb_step_output(&mut running_context, &mut current, index, execution.output.as_ref());
    }
    (running_context, current)
}
