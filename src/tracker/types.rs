use std::collections::BTreeMap;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::agents::{AgentInput, AgentOutput, Payload};
use crate::errors::AgentrailError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = AgentrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(AgentrailError::InvalidArgument(format!("unknown execution status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ChainExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl std::fmt::Display for ChainExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ChainExecutionStatus {
    type Err = AgentrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AgentrailError::InvalidArgument(format!("unknown chain execution status '{}'", other))),
        }
    }
}

/// Durable record of one agent invocation.
///
/// Created `running`; moves exactly once to `completed` or `failed`.
/// `output`, `completed_at` and `duration_ms` are set together at that transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentExecution {
    pub id: String,
    pub agent_type: String,
    pub agent_name: String,
    pub status: ExecutionStatus,
    pub input: AgentInput,
    pub output: Option<AgentOutput>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub error: String,
    pub user_id: String,
    pub parent_execution_id: Option<String>,
    #[serde(default)]
    pub metadata: Payload,
}

impl AgentExecution {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply the terminal transition in memory. An error always forces `failed`.
    pub fn finish(
        &mut self,
        status: ExecutionStatus,
        output: AgentOutput,
        error: Option<&str>,
        completed_at: DateTime<Utc>,
    ) {
        self.status = if error.is_some() { ExecutionStatus::Failed } else { status };
        self.error = error.unwrap_or_default().to_string();
        self.output = Some(output);
        self.duration_ms = Some(elapsed_ms(self.started_at, completed_at));
        self.completed_at = Some(completed_at);
    }
}

pub(crate) fn elapsed_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    to.signed_duration_since(from).num_milliseconds().max(0) as u64
}

/// Durable record of one run of a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentChainExecution {
    pub id: String,
    pub chain_id: String,
    pub status: ChainExecutionStatus,
    /// Index of the step being (or last) run. Never decreases.
    pub current_step: usize,
    /// Input the run was started with; kept so a parked run can be resumed.
    pub input: AgentInput,
    /// Snapshots of every step execution in run order. Append-only.
    pub step_executions: Vec<AgentExecution>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: String,
    pub user_id: String,
}

impl AgentChainExecution {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionFilter {
    pub user_id: Option<String>,
    pub agent_type: Option<String>,
    pub status: Option<ExecutionStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub parent_execution_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainExecutionFilter {
    pub chain_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<ChainExecutionStatus>,
    pub limit: Option<usize>,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Hour,
    Day,
    Week,
    Month,
}

impl FromStr for TimeBucket {
    type Err = AgentrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(AgentrailError::InvalidArgument(format!(
                "unknown time bucket '{}', expected hour, day, week or month",
                other
            ))),
        }
    }
}

/// Metrics query. The date range is mandatory and inclusive on both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsFilter {
    pub agent_type: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub bucket: Option<TimeBucket>,
}

/// The fields of an execution that metrics are computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub agent_type: String,
    pub status: ExecutionStatus,
    pub duration_ms: Option<u64>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentTypeMetrics {
    pub count: u64,
    pub successful: u64,
    pub success_rate: f64,
    pub average_duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketMetrics {
    pub bucket_start: DateTime<Utc>,
    pub count: u64,
    pub successful: u64,
    pub failed: u64,
    pub average_duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_executions: u64,
    pub successful_executions: u64,
    /// Everything that did not complete successfully, including runs still in flight.
    pub failed_executions: u64,
    pub average_duration_ms: f64,
    pub by_agent_type: BTreeMap<String, AgentTypeMetrics>,
    pub by_time_bucket: Vec<BucketMetrics>,
}
