use std::collections::BTreeMap;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use super::types::*;

#[derive(Default)]
struct Accumulator {
    count: u64,
    successful: u64,
    duration_total: u64,
    duration_samples: u64,
}

impl Accumulator {
    fn add(&mut self, sample: &MetricSample) {
        self.count += 1;
        if sample.status == ExecutionStatus::Completed {
            self.successful += 1;
        }
        if let Some(ms) = sample.duration_ms {
            self.duration_total += ms;
            self.duration_samples += 1;
        }
    }

    fn average_duration_ms(&self) -> f64 {
        if self.duration_samples == 0 {
            0.0
        } else {
            self.duration_total as f64 / self.duration_samples as f64
        }
    }

    fn success_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.successful as f64 / self.count as f64
        }
    }
}

/// Start of the UTC calendar bucket that `at` falls in. Weeks start on Monday.
pub fn bucket_start(at: DateTime<Utc>, bucket: TimeBucket) -> DateTime<Utc> {
    let day_start = |date: NaiveDate| {
        date.and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .unwrap_or(at)
    };
    match bucket {
        TimeBucket::Hour => at
            .date_naive()
            .and_hms_opt(at.hour(), 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .unwrap_or(at),
        TimeBucket::Day => day_start(at.date_naive()),
        TimeBucket::Week => {
            let offset = at.weekday().num_days_from_monday() as i64;
            day_start(at.date_naive() - Duration::days(offset))
        }
        TimeBucket::Month => NaiveDate::from_ymd_opt(at.year(), at.month(), 1)
            .map(day_start)
            .unwrap_or(at),
    }
}

/// Aggregate samples already restricted to the filter's agent type and date range.
pub fn compute_metrics(samples: &[MetricSample], filter: &MetricsFilter) -> ExecutionMetrics {
    let mut overall = Accumulator::default();
    let mut per_type: BTreeMap<String, Accumulator> = BTreeMap::new();
    let mut per_bucket: BTreeMap<DateTime<Utc>, Accumulator> = BTreeMap::new();

    for sample in samples {
        overall.add(sample);
        per_type.entry(sample.agent_type.clone()).or_default().add(sample);
        if let Some(bucket) = filter.bucket {
            per_bucket.entry(bucket_start(sample.started_at, bucket)).or_default().add(sample);
        }
    }

    let by_agent_type = per_type
        .into_iter()
        .map(|(agent_type, acc)| {
            (agent_type, AgentTypeMetrics {
                count: acc.count,
                successful: acc.successful,
                success_rate: acc.success_rate(),
                average_duration_ms: acc.average_duration_ms(),
            })
        })
        .collect();

    let by_time_bucket = per_bucket
        .into_iter()
        .map(|(bucket_start, acc)| BucketMetrics {
            bucket_start,
            count: acc.count,
            successful: acc.successful,
            failed: acc.count - acc.successful,
            average_duration_ms: acc.average_duration_ms(),
        })
        .collect();

    ExecutionMetrics {
        period_start: filter.start_date,
        period_end: filter.end_date,
        total_executions: overall.count,
        successful_executions: overall.successful,
        failed_executions: overall.count - overall.successful,
        average_duration_ms: overall.average_duration_ms(),
        by_agent_type,
        by_time_bucket,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn sample(agent_type: &str, status: ExecutionStatus, duration_ms: Option<u64>, started: &str) -> MetricSample {
        MetricSample {
            agent_type: agent_type.to_string(),
            status,
            duration_ms,
            started_at: at(started),
        }
    }

    fn filter(bucket: Option<TimeBucket>) -> MetricsFilter {
        MetricsFilter {
            agent_type: None,
            start_date: at("2026-01-01T00:00:00Z"),
            end_date: at("2026-12-31T23:59:59Z"),
            bucket,
        }
    }

    #[test]
    fn test_compute_metrics_totals_and_breakdown() {
        let samples = vec![
            sample("document", ExecutionStatus::Completed, Some(100), "2026-03-02T10:15:00Z"),
            sample("document", ExecutionStatus::Failed, Some(300), "2026-03-02T10:45:00Z"),
            sample("code-gen", ExecutionStatus::Completed, Some(50), "2026-03-03T08:00:00Z"),
            sample("code-gen", ExecutionStatus::Running, None, "2026-03-03T09:00:00Z"),
        ];
        let m = compute_metrics(&samples, &filter(None));

        assert_eq!(m.total_executions, 4);
        assert_eq!(m.successful_executions, 2);
        assert_eq!(m.failed_executions, 2);
        assert!((m.average_duration_ms - 150.0).abs() < f64::EPSILON);

        let doc = &m.by_agent_type["document"];
        assert_eq!(doc.count, 2);
        assert!((doc.success_rate - 0.5).abs() < f64::EPSILON);
        assert!((doc.average_duration_ms - 200.0).abs() < f64::EPSILON);

        let code = &m.by_agent_type["code-gen"];
        assert_eq!(code.successful, 1);
        assert!((code.average_duration_ms - 50.0).abs() < f64::EPSILON);
        assert!(m.by_time_bucket.is_empty());
    }

    #[test]
    fn test_compute_metrics_empty() {
        let m = compute_metrics(&[], &filter(Some(TimeBucket::Day)));
        assert_eq!(m.total_executions, 0);
        assert_eq!(m.average_duration_ms, 0.0);
        assert!(m.by_agent_type.is_empty());
        assert!(m.by_time_bucket.is_empty());
    }

    #[test]
    fn test_daily_buckets_ascending() {
        let samples = vec![
            sample("document", ExecutionStatus::Completed, Some(10), "2026-03-03T23:59:00Z"),
            sample("document", ExecutionStatus::Failed, Some(30), "2026-03-02T01:00:00Z"),
            sample("document", ExecutionStatus::Completed, Some(20), "2026-03-03T00:00:00Z"),
        ];
        let m = compute_metrics(&samples, &filter(Some(TimeBucket::Day)));
        assert_eq!(m.by_time_bucket.len(), 2);
        assert_eq!(m.by_time_bucket[0].bucket_start, at("2026-03-02T00:00:00Z"));
        assert_eq!(m.by_time_bucket[0].failed, 1);
        assert_eq!(m.by_time_bucket[1].count, 2);
        assert!((m.by_time_bucket[1].average_duration_ms - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bucket_start_boundaries() {
        let t = at("2026-03-05T14:37:12Z"); // Thursday
        assert_eq!(bucket_start(t, TimeBucket::Hour), at("2026-03-05T14:00:00Z"));
        assert_eq!(bucket_start(t, TimeBucket::Day), at("2026-03-05T00:00:00Z"));
        assert_eq!(bucket_start(t, TimeBucket::Week), at("2026-03-02T00:00:00Z"));
        assert_eq!(bucket_start(t, TimeBucket::Month), at("2026-03-01T00:00:00Z"));
    }

    #[test]
    fn test_week_bucket_on_monday_is_identity_day() {
        let monday = at("2026-03-02T00:00:00Z");
        assert_eq!(bucket_start(monday, TimeBucket::Week), monday);
    }
}
