use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, OptionalExtension, Row};
use crate::errors::AgentrailError;
use crate::tracker::store::{ChainExecutionRow, ChainExecutionUpdate};
use crate::tracker::types::ChainExecutionFilter;
use super::connection::{db_err, encode_time};
use super::executions::{opt_time_col, page, time_col};
use super::Database;

const CHAIN_COLUMNS: &str = "id, chain_id, status, current_step, input_json, chain_json, started_at, completed_at, error_message, user_id";

fn read_chain_execution(row: &Row) -> rusqlite::Result<ChainExecutionRow> {
    Ok(ChainExecutionRow {
        id: row.get(0)?,
        chain_id: row.get(1)?,
        status: row.get(2)?,
        current_step: row.get::<_, i64>(3)?.max(0) as usize,
        input: row.get(4)?,
        chain: row.get(5)?,
        started_at: time_col(row, 6)?,
        completed_at: opt_time_col(row, 7)?,
        error: row.get(8)?,
        user_id: row.get(9)?,
    })
}

impl Database {
    pub fn insert_chain_execution(&self, row: &ChainExecutionRow) -> Result<(), AgentrailError> {
        let conn = self.lock()?;
        conn.execute(
            &format!("INSERT INTO chain_executions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)", CHAIN_COLUMNS),
            rusqlite::params![
                row.id,
                row.chain_id,
                row.status,
                row.current_step as i64,
                row.input,
                row.chain,
                encode_time(&row.started_at),
                row.completed_at.as_ref().map(encode_time),
                row.error,
                row.user_id,
            ],
        ).map_err(db_err("Failed to insert chain execution"))?;
        Ok(())
    }

    pub fn get_chain_execution(&self, id: &str) -> Result<Option<ChainExecutionRow>, AgentrailError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM chain_executions WHERE id = ?1", CHAIN_COLUMNS))
            .map_err(db_err("Query failed"))?;
        stmt.query_row(rusqlite::params![id], read_chain_execution)
            .optional()
            .map_err(db_err("Query error"))
    }

    pub fn update_chain_execution(&self, update: &ChainExecutionUpdate) -> Result<bool, AgentrailError> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE chain_executions SET status = ?2, current_step = ?3, completed_at = ?4, error_message = ?5 WHERE id = ?1",
            rusqlite::params![
                update.id,
                update.status,
                update.current_step as i64,
                update.completed_at.as_ref().map(encode_time),
                update.error,
            ],
        ).map_err(db_err("Update failed"))?;
        Ok(affected > 0)
    }

    pub fn query_chain_executions(&self, filter: &ChainExecutionFilter) -> Result<Vec<ChainExecutionRow>, AgentrailError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();

        if let Some(chain_id) = &filter.chain_id {
            clauses.push("chain_id = ?");
            params.push(SqlValue::Text(chain_id.clone()));
        }
        if let Some(user_id) = &filter.user_id {
            clauses.push("user_id = ?");
            params.push(SqlValue::Text(user_id.clone()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            params.push(SqlValue::Text(status.as_str().to_string()));
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
            "SELECT {} FROM chain_executions {} ORDER BY started_at DESC, rowid DESC LIMIT ? OFFSET ?",
            CHAIN_COLUMNS, where_sql
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(db_err("Query failed"))?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), read_chain_execution)
            .map_err(db_err("Query error"))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(db_err("Row error"))?);
        }
        Ok(results)
    }

    pub fn append_chain_step(
        &self,
        chain_execution_id: &str,
        position: usize,
        execution_id: &str,
        snapshot: &str,
    ) -> Result<(), AgentrailError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO chain_step_executions (chain_execution_id, position, execution_id, snapshot_json) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![chain_execution_id, position as i64, execution_id, snapshot],
        ).map_err(db_err("Failed to append chain step"))?;
        Ok(())
    }

    pub fn chain_steps(&self, chain_execution_id: &str) -> Result<Vec<String>, AgentrailError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT snapshot_json FROM chain_step_executions WHERE chain_execution_id = ?1 ORDER BY position ASC")
            .map_err(db_err("Query failed"))?;
        let rows = stmt
            .query_map(rusqlite::params![chain_execution_id], |row: &Row| row.get::<_, String>(0))
            .map_err(db_err("Query error"))?;

        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row.map_err(db_err("Row error"))?);
        }
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn base_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-04-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn make_chain_row(id: &str, chain_id: &str, started_at: DateTime<Utc>) -> ChainExecutionRow {
        ChainExecutionRow {
            id: id.to_string(),
            chain_id: chain_id.to_string(),
            status: "running".to_string(),
            current_step: 0,
            input: r#"{"task":"t"}"#.to_string(),
            chain: r#"{"name":"a","steps":[]}"#.to_string(),
            started_at,
            completed_at: None,
            error: String::new(),
            user_id: "user-1".to_string(),
        }
    }

    #[test]
    fn test_db_chain_execution_lifecycle() {
        let db = Database::in_memory().unwrap();
        db.insert_chain_execution(&make_chain_row("ce-1", "chain-a", base_time())).unwrap();

        assert!(db.update_chain_execution(&ChainExecutionUpdate {
            id: "ce-1".to_string(),
            status: "failed".to_string(),
            current_step: 1,
            completed_at: Some(base_time() + Duration::seconds(3)),
            error: "step 1 failed".to_string(),
        }).unwrap());

        let loaded = db.get_chain_execution("ce-1").unwrap().unwrap();
        assert_eq!(loaded.status, "failed");
        assert_eq!(loaded.current_step, 1);
        assert_eq!(loaded.completed_at, Some(base_time() + Duration::seconds(3)));
        assert_eq!(loaded.error, "step 1 failed");
        assert_eq!(loaded.chain, r#"{"name":"a","steps":[]}"#);
    }

    #[test]
    fn test_db_chain_steps_ordered_by_position() {
        let db = Database::in_memory().unwrap();
        db.insert_chain_execution(&make_chain_row("ce-2", "chain-a", base_time())).unwrap();
        db.append_chain_step("ce-2", 1, "exec-b", "{\"n\":2}").unwrap();
        db.append_chain_step("ce-2", 0, "exec-a", "{\"n\":1}").unwrap();

        let steps = db.chain_steps("ce-2").unwrap();
        assert_eq!(steps, vec!["{\"n\":1}".to_string(), "{\"n\":2}".to_string()]);
    }

    #[test]
    fn test_db_chain_step_position_is_unique() {
        let db = Database::in_memory().unwrap();
        db.insert_chain_execution(&make_chain_row("ce-3", "chain-a", base_time())).unwrap();
        db.append_chain_step("ce-3", 0, "exec-a", "{}").unwrap();
        let dup = db.append_chain_step("ce-3", 0, "exec-b", "{}");
        assert!(matches!(dup, Err(AgentrailError::Persistence(_))));
    }

    #[test]
    fn test_db_chain_step_requires_parent_row() {
        let db = Database::in_memory().unwrap();
        assert!(db.append_chain_step("no-such-run", 0, "exec-a", "{}").is_err());
    }

    #[test]
    fn test_db_query_chain_executions() {
        let db = Database::in_memory().unwrap();
        db.insert_chain_execution(&make_chain_row("ce-a", "chain-a", base_time())).unwrap();
        db.insert_chain_execution(&make_chain_row("ce-b", "chain-b", base_time() + Duration::seconds(1))).unwrap();
        db.insert_chain_execution(&make_chain_row("ce-c", "chain-a", base_time() + Duration::seconds(2))).unwrap();

        let for_a = db.query_chain_executions(&ChainExecutionFilter {
            chain_id: Some("chain-a".to_string()),
            ..Default::default()
        }).unwrap();
        let ids: Vec<&str> = for_a.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ce-c", "ce-a"]);

        let first = db.query_chain_executions(&ChainExecutionFilter { limit: Some(1), ..Default::default() }).unwrap();
        assert_eq!(first[0].id, "ce-c");
    }
}
