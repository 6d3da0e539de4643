use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params_from_iter, OptionalExtension, Row};
use crate::errors::AgentrailError;
use crate::tracker::store::{ExecutionRow, ExecutionUpdate};
use crate::tracker::types::{ExecutionFilter, ExecutionStatus, MetricSample, MetricsFilter};
use super::connection::{db_err, decode_time, encode_time};
use super::Database;

const EXECUTION_COLUMNS: &str = "id, agent_type, agent_name, status, input_json, output_json, started_at, completed_at, duration_ms, error_message, user_id, parent_execution_id, metadata_json";

fn time_from_text(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    decode_time(text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn time_col(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    time_from_text(idx, &text)
}

pub(crate) fn opt_time_col(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<String>>(idx)?
        .map(|text| time_from_text(idx, &text))
        .transpose()
}

fn read_execution(row: &Row) -> rusqlite::Result<ExecutionRow> {
    Ok(ExecutionRow {
        id: row.get(0)?,
        agent_type: row.get(1)?,
        agent_name: row.get(2)?,
        status: row.get(3)?,
        input: row.get(4)?,
        output: row.get(5)?,
        started_at: time_col(row, 6)?,
        completed_at: opt_time_col(row, 7)?,
        duration_ms: row.get::<_, Option<i64>>(8)?.map(|ms| ms.max(0) as u64),
        error: row.get(9)?,
        user_id: row.get(10)?,
        parent_execution_id: row.get(11)?,
        metadata: row.get(12)?,
    })
}

/// SQL `LIMIT`/`OFFSET` values; a negative limit means no limit in SQLite.
pub(crate) fn page(limit: Option<usize>, offset: usize) -> (i64, i64) {
    (limit.map_or(-1, |l| l as i64), offset as i64)
}

impl Database {
    pub fn insert_execution(&self, row: &ExecutionRow) -> Result<(), AgentrailError> {
        let conn = self.lock()?;
        conn.execute(
            &format!("INSERT INTO agent_executions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)", EXECUTION_COLUMNS),
            rusqlite::params![
                row.id,
                row.agent_type,
                row.agent_name,
                row.status,
                row.input,
                row.output,
                encode_time(&row.started_at),
                row.completed_at.as_ref().map(encode_time),
                row.duration_ms.map(|ms| ms as i64),
                row.error,
                row.user_id,
                row.parent_execution_id,
                row.metadata,
            ],
        ).map_err(db_err("Failed to insert execution"))?;
        Ok(())
    }

    pub fn get_execution(&self, id: &str) -> Result<Option<ExecutionRow>, AgentrailError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM agent_executions WHERE id = ?1", EXECUTION_COLUMNS))
            .map_err(db_err("Query failed"))?;
        stmt.query_row(rusqlite::params![id], read_execution)
            .optional()
            .map_err(db_err("Query error"))
    }

    pub fn update_execution(&self, update: &ExecutionUpdate) -> Result<bool, AgentrailError> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE agent_executions SET status = ?2, output_json = ?3, completed_at = ?4, duration_ms = ?5, error_message = ?6 WHERE id = ?1",
            rusqlite::params![
                update.id,
                update.status,
                update.output,
                encode_time(&update.completed_at),
                update.duration_ms as i64,
                update.error,
            ],
        ).map_err(db_err("Update failed"))?;
        Ok(affected > 0)
    }

    pub fn query_executions(&self, filter: &ExecutionFilter) -> Result<Vec<ExecutionRow>, AgentrailError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();

        if let Some(user_id) = &filter.user_id {
            clauses.push("user_id = ?");
            params.push(SqlValue::Text(user_id.clone()));
        }
        if let Some(agent_type) = &filter.agent_type {
            clauses.push("agent_type = ?");
            params.push(SqlValue::Text(agent_type.clone()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            params.push(SqlValue::Text(status.as_str().to_string()));
        }
        if let Some(start) = &filter.start_date {
            clauses.push("started_at >= ?");
            params.push(SqlValue::Text(encode_time(start)));
        }
        if let Some(end) = &filter.end_date {
            clauses.push("started_at <= ?");
            params.push(SqlValue::Text(encode_time(end)));
        }
        if let Some(parent) = &filter.parent_execution_id {
            clauses.push("parent_execution_id = ?");
            params.push(SqlValue::Text(parent.clone()));
        }

        let (limit, offset) = page(filter.limit, filter.offset);
        params.push(SqlValue::Integer(limit));
        params.push(SqlValue::Integer(offset));

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM agent_executions {} ORDER BY started_at DESC, rowid DESC LIMIT ? OFFSET ?",
            EXECUTION_COLUMNS, where_sql
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(db_err("Query failed"))?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), read_execution)
            .map_err(db_err("Query error"))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(db_err("Row error"))?);
        }
        Ok(results)
    }

    pub fn metric_samples(&self, filter: &MetricsFilter) -> Result<Vec<MetricSample>, AgentrailError> {
        let mut sql = String::from(
            "SELECT agent_type, status, duration_ms, started_at FROM agent_executions WHERE started_at >= ?1 AND started_at <= ?2",
        );
        let mut params = vec![
            SqlValue::Text(encode_time(&filter.start_date)),
            SqlValue::Text(encode_time(&filter.end_date)),
        ];
        if let Some(agent_type) = &filter.agent_type {
            sql.push_str(" AND agent_type = ?3");
            params.push(SqlValue::Text(agent_type.clone()));
        }
        sql.push_str(" ORDER BY started_at ASC");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(db_err("Query failed"))?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row: &Row| {
                let status: String = row.get(1)?;
                let status = status.parse::<ExecutionStatus>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
                })?;
                Ok(MetricSample {
                    agent_type: row.get(0)?,
                    status,
                    duration_ms: row.get::<_, Option<i64>>(2)?.map(|ms| ms.max(0) as u64),
                    started_at: time_col(row, 3)?,
                })
            })
            .map_err(db_err("Query error"))?;

        let mut samples = Vec::new();
        for row in rows {
            samples.push(row.map_err(db_err("Row error"))?);
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_row(id: &str, agent_type: &str, user_id: &str, started_at: DateTime<Utc>) -> ExecutionRow {
        ExecutionRow {
            id: id.to_string(),
            agent_type: agent_type.to_string(),
            agent_name: format!("{} agent", agent_type),
            status: "running".to_string(),
            input: r#"{"task":"t"}"#.to_string(),
            output: None,
            started_at,
            completed_at: None,
            duration_ms: None,
            error: String::new(),
            user_id: user_id.to_string(),
            parent_execution_id: None,
            metadata: "{}".to_string(),
        }
    }

    fn base_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-04-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_db_insert_and_get_execution() {
        let db = Database::in_memory().unwrap();
        let row = make_row("exec-1", "document", "user-1", base_time());
        db.insert_execution(&row).unwrap();

        let loaded = db.get_execution("exec-1").unwrap().unwrap();
        assert_eq!(loaded, row);
    }

    #[test]
    fn test_db_get_nonexistent_execution() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_execution("missing").unwrap().is_none());
    }

    #[test]
    fn test_db_update_execution() {
        let db = Database::in_memory().unwrap();
        db.insert_execution(&make_row("exec-2", "document", "user-1", base_time())).unwrap();

        let updated = db.update_execution(&ExecutionUpdate {
            id: "exec-2".to_string(),
            status: "completed".to_string(),
            output: Some(r#"{"success":true}"#.to_string()),
            completed_at: base_time() + Duration::milliseconds(1500),
            duration_ms: 1500,
            error: String::new(),
        }).unwrap();
        assert!(updated);

        let loaded = db.get_execution("exec-2").unwrap().unwrap();
        assert_eq!(loaded.status, "completed");
        assert_eq!(loaded.duration_ms, Some(1500));
        assert_eq!(loaded.output.as_deref(), Some(r#"{"success":true}"#));
    }

    #[test]
    fn test_db_update_missing_execution() {
        let db = Database::in_memory().unwrap();
        let updated = db.update_execution(&ExecutionUpdate {
            id: "ghost".to_string(),
            status: "failed".to_string(),
            output: None,
            completed_at: base_time(),
            duration_ms: 0,
            error: "boom".to_string(),
        }).unwrap();
        assert!(!updated);
    }

    #[test]
    fn test_db_query_filters_and_order() {
        let db = Database::in_memory().unwrap();
        for i in 0..5 {
            let user = if i % 2 == 0 { "alice" } else { "bob" };
            let agent_type = if i < 3 { "document" } else { "code-gen" };
            db.insert_execution(&make_row(&format!("exec-{}", i), agent_type, user, base_time() + Duration::minutes(i))).unwrap();
        }

        let all = db.query_executions(&ExecutionFilter::default()).unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["exec-4", "exec-3", "exec-2", "exec-1", "exec-0"]);

        let alice = db.query_executions(&ExecutionFilter {
            user_id: Some("alice".to_string()),
            ..Default::default()
        }).unwrap();
        assert_eq!(alice.len(), 3);

        let docs_for_alice = db.query_executions(&ExecutionFilter {
            user_id: Some("alice".to_string()),
            agent_type: Some("document".to_string()),
            ..Default::default()
        }).unwrap();
        assert_eq!(docs_for_alice.len(), 2);

        let ranged = db.query_executions(&ExecutionFilter {
            start_date: Some(base_time() + Duration::minutes(1)),
            end_date: Some(base_time() + Duration::minutes(3)),
            ..Default::default()
        }).unwrap();
        assert_eq!(ranged.len(), 3);
    }

    #[test]
    fn test_db_query_pagination() {
        let db = Database::in_memory().unwrap();
        for i in 0..5 {
            db.insert_execution(&make_row(&format!("exec-{}", i), "document", "u", base_time() + Duration::seconds(i))).unwrap();
        }

        let page1 = db.query_executions(&ExecutionFilter { limit: Some(2), ..Default::default() }).unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page1[0].id, "exec-4");

        let page3 = db.query_executions(&ExecutionFilter { limit: Some(2), offset: 4, ..Default::default() }).unwrap();
        assert_eq!(page3.len(), 1);
        assert_eq!(page3[0].id, "exec-0");
    }

    #[test]
    fn test_db_query_by_status_and_parent() {
        let db = Database::in_memory().unwrap();
        let mut child = make_row("child", "design", "u", base_time());
        child.parent_execution_id = Some("chain-exec-1".to_string());
        child.status = "failed".to_string();
        db.insert_execution(&child).unwrap();
        db.insert_execution(&make_row("other", "design", "u", base_time())).unwrap();

        let by_parent = db.query_executions(&ExecutionFilter {
            parent_execution_id: Some("chain-exec-1".to_string()),
            ..Default::default()
        }).unwrap();
        assert_eq!(by_parent.len(), 1);

        let failed = db.query_executions(&ExecutionFilter {
            status: Some(ExecutionStatus::Failed),
            ..Default::default()
        }).unwrap();
        assert_eq!(failed[0].id, "child");
    }

    #[test]
    fn test_db_metric_samples_range_and_type() {
        let db = Database::in_memory().unwrap();
        db.insert_execution(&make_row("a", "document", "u", base_time())).unwrap();
        db.insert_execution(&make_row("b", "design", "u", base_time() + Duration::hours(1))).unwrap();
        db.insert_execution(&make_row("c", "document", "u", base_time() + Duration::days(2))).unwrap();

        let filter = MetricsFilter {
            agent_type: None,
            start_date: base_time(),
            end_date: base_time() + Duration::hours(1),
            bucket: None,
        };
        assert_eq!(db.metric_samples(&filter).unwrap().len(), 2);

        let docs = MetricsFilter { agent_type: Some("document".to_string()), ..filter };
        let samples = db.metric_samples(&docs).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].status, ExecutionStatus::Running);
    }

    #[test]
    fn test_db_unreadable_timestamp_is_persistence_error() {
        let db = Database::in_memory().unwrap();
        db.insert_execution(&make_row("exec-bad", "document", "user-1", base_time())).unwrap();
        db.lock()
            .unwrap()
            .execute("UPDATE agent_executions SET completed_at = 'last tuesday' WHERE id = 'exec-bad'", [])
            .unwrap();

        let err = db.get_execution("exec-bad").unwrap_err();
        assert!(matches!(err, AgentrailError::Persistence(_)));
        assert!(err.to_string().contains("last tuesday"));
    }
}
