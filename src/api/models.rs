use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::errors::AgentrailError;
use crate::tracker::{MetricsFilter, TimeBucket};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
    pub built_at: &'static str,
}

/// Query string of `GET /api/metrics`. Both dates are required.
#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    pub agent_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub bucket: Option<TimeBucket>,
}

impl MetricsQuery {
    pub fn into_filter(self) -> Result<MetricsFilter, AgentrailError> {
        let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) else {
            return Err(AgentrailError::InvalidArgument(
                "metrics require both start_date and end_date".into(),
            ));
        };
        Ok(MetricsFilter {
            agent_type: self.agent_type,
            start_date,
            end_date,
            bucket: self.bucket,
        })
    }
}
