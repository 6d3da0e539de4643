use crate::cli::commands::{ExecutionsArgs, MetricsArgs};
use crate::cli::{load_config, open_manager, parse_time, Cli};
use crate::errors::AgentrailError;
use crate::tracker::{ExecutionFilter, ExecutionStatus, MetricsFilter, TimeBucket};
use crate::utils::formatting::{format_duration, format_rate};
use crate::utils::truncation::truncate_cell;

pub async fn handle_agents(cli: &Cli) -> Result<(), AgentrailError> {
    let config = load_config(cli).await?;
    let manager = open_manager(&config).await?;
    for agent in manager.list_agents().await {
        println!("{:<12} {:<20} {}", agent.agent_type, agent.name, agent.description);
    }
    Ok(())
}

pub async fn handle_executions(cli: &Cli, args: ExecutionsArgs) -> Result<(), AgentrailError> {
    let config = load_config(cli).await?;
    let manager = open_manager(&config).await?;

    let filter = ExecutionFilter {
        user_id: args.owner,
        agent_type: args.agent_type,
        status: args.status.as_deref().map(str::parse::<ExecutionStatus>).transpose()?,
        start_date: args.from.as_deref().map(|s| parse_time(s, false)).transpose()?,
        end_date: args.to.as_deref().map(|s| parse_time(s, true)).transpose()?,
        parent_execution_id: args.parent,
        limit: Some(args.limit),
        offset: args.offset,
    };
    let executions = manager.tracker().list_executions(&filter).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&executions)?);
        return Ok(());
    }
    if executions.is_empty() {
        println!("No executions found");
        return Ok(());
    }
    println!("{:<36}  {:<12} {:<10} {:>8}  {:<20}  TASK", "ID", "AGENT", "STATUS", "DURATION", "STARTED");
    for e in &executions {
        let duration = e.duration_ms.map(format_duration).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<36}  {:<12} {:<10} {:>8}  {:<20}  {}",
            e.id,
            e.agent_type,
            e.status,
            duration,
            e.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            truncate_cell(&e.input.task)
        );
    }
    Ok(())
}

pub async fn handle_metrics(cli: &Cli, args: MetricsArgs) -> Result<(), AgentrailError> {
    let config = load_config(cli).await?;
    let manager = open_manager(&config).await?;

    let filter = MetricsFilter {
        agent_type: args.agent_type,
        start_date: parse_time(&args.from, false)?,
        end_date: parse_time(&args.to, true)?,
        bucket: args.bucket.as_deref().map(str::parse::<TimeBucket>).transpose()?,
    };
    let metrics = manager.tracker().get_execution_metrics(&filter).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    println!("Period:     {} .. {}", metrics.period_start.to_rfc3339(), metrics.period_end.to_rfc3339());
    println!("Total:      {}", metrics.total_executions);
    println!("Successful: {}", metrics.successful_executions);
    println!("Failed:     {}", metrics.failed_executions);
    println!("Avg time:   {}", format_duration(metrics.average_duration_ms.round() as u64));

    if !metrics.by_agent_type.is_empty() {
        println!();
        println!("{:<12} {:>6} {:>8} {:>10}", "AGENT", "COUNT", "SUCCESS", "AVG");
        for (agent_type, m) in &metrics.by_agent_type {
            println!(
                "{:<12} {:>6} {:>8} {:>10}",
                agent_type,
                m.count,
                format_rate(m.success_rate),
                format_duration(m.average_duration_ms.round() as u64)
            );
        }
    }
    if !metrics.by_time_bucket.is_empty() {
        println!();
        println!("{:<20} {:>6} {:>6} {:>6} {:>10}", "BUCKET", "COUNT", "OK", "FAILED", "AVG");
        for b in &metrics.by_time_bucket {
            println!(
                "{:<20} {:>6} {:>6} {:>6} {:>10}",
                b.bucket_start.format("%Y-%m-%d %H:%M").to_string(),
                b.count,
                b.successful,
                b.failed,
                format_duration(b.average_duration_ms.round() as u64)
            );
        }
    }
    Ok(())
}
