use tokio_util::sync::CancellationToken;
use crate::agents::AgentInput;
use crate::cli::commands::{ChainArgs, ResumeArgs, RunArgs};
use crate::cli::{cancel_on_ctrl_c, load_config, open_manager, parse_param, read_input_file, Cli};
use crate::errors::AgentrailError;
use crate::tracker::{AgentChainExecution, AgentExecution, ExecutionStatus};
use crate::utils::formatting::format_duration;
use tracing::info;

pub async fn handle_run(cli: &Cli, args: RunArgs) -> Result<(), AgentrailError> {
    let config = load_config(cli).await?;
    let manager = open_manager(&config).await?;

    let mut input = AgentInput::new(args.task);
    for raw in &args.params {
        let (key, value) = parse_param(raw)?;
        input.parameters.insert(key, value);
    }
    for path in &args.files {
        input.files.push(read_input_file(path).await?);
    }

    let ctx = CancellationToken::new();
    cancel_on_ctrl_c(ctx.clone());
    info!(agent_type = %args.agent_type, user = %cli.user, "Running agent");
    let execution = manager.execute_agent(&ctx, &args.agent_type, &input, &cli.user).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&execution)?);
    } else {
        print_execution(&execution);
    }

    if execution.status == ExecutionStatus::Failed {
        return Err(AgentrailError::Agent(execution.error));
    }
    Ok(())
}

pub async fn handle_chain(cli: &Cli, args: ChainArgs) -> Result<(), AgentrailError> {
    let config = load_config(cli).await?;
    let manager = open_manager(&config).await?;

    let mut input = AgentInput::new(args.task);
    for path in &args.files {
        input.files.push(read_input_file(path).await?);
    }

    let ctx = CancellationToken::new();
    cancel_on_ctrl_c(ctx.clone());
    let result = manager.execute_chain(&ctx, &args.chain_id, &input, &cli.user).await;
    report_chain(result, args.json)
}

pub async fn handle_resume(cli: &Cli, args: ResumeArgs) -> Result<(), AgentrailError> {
    let config = load_config(cli).await?;
    let manager = open_manager(&config).await?;

    let ctx = CancellationToken::new();
    cancel_on_ctrl_c(ctx.clone());
    let result = manager.resume_chain(&ctx, &args.chain_execution_id).await;
    report_chain(result, args.json)
}

/// Print the chain record, including the partial one carried by a step failure.
fn report_chain(
    result: Result<AgentChainExecution, AgentrailError>,
    json: bool,
) -> Result<(), AgentrailError> {
    let execution = match &result {
        Ok(execution) => Some(execution),
        Err(e) => e.chain_execution(),
    };
    if let Some(execution) = execution {
        if json {
            println!("{}", serde_json::to_string_pretty(execution)?);
        } else {
            print_chain_execution(execution);
        }
    }
    result.map(|_| ())
}

fn print_execution(execution: &AgentExecution) {
    println!("Execution: {}", execution.id);
    println!("Agent:     {} ({})", execution.agent_name, execution.agent_type);
    println!("Status:    {}", execution.status);
    if let Some(ms) = execution.duration_ms {
        println!("Duration:  {}", format_duration(ms));
    }
    if !execution.error.is_empty() {
        println!("Error:     {}", execution.error);
    }
    if let Some(output) = &execution.output {
        if !output.result.is_null() {
            let result = serde_json::to_string_pretty(&output.result).unwrap_or_default();
            println!("Result:\n{}", result);
        }
        for file in &output.files {
            println!("File:      {}", file.path.as_deref().unwrap_or(&file.name));
        }
        for step in &output.next_steps {
            println!("Next:      {}", step);
        }
    }
}

fn print_chain_execution(execution: &AgentChainExecution) {
    println!("Chain execution: {}", execution.id);
    println!("Chain:           {}", execution.chain_id);
    println!("Status:          {}", execution.status);
    println!("Current step:    {}", execution.current_step);
    if !execution.error.is_empty() {
        println!("Error:           {}", execution.error);
    }
    for (i, step) in execution.step_executions.iter().enumerate() {
        let duration = step.duration_ms.map(format_duration).unwrap_or_else(|| "-".to_string());
        println!("  [{}] {:<12} {:<10} {:>8}  {}", i, step.agent_type, step.status, duration, step.id);
    }
}
