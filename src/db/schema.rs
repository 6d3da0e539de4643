pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS agent_executions (
    id TEXT PRIMARY KEY,
    agent_type TEXT NOT NULL,
    agent_name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'running',
    input_json TEXT NOT NULL,
    output_json TEXT,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    duration_ms INTEGER,
    error_message TEXT NOT NULL DEFAULT '',
    user_id TEXT NOT NULL,
    parent_execution_id TEXT,
    metadata_json TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS chain_executions (
    id TEXT PRIMARY KEY,
    chain_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'running',
    current_step INTEGER NOT NULL DEFAULT 0,
    input_json TEXT NOT NULL,
    chain_json TEXT NOT NULL,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    error_message TEXT NOT NULL DEFAULT '',
    user_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chain_step_executions (
    chain_execution_id TEXT NOT NULL REFERENCES chain_executions(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    execution_id TEXT NOT NULL,
    snapshot_json TEXT NOT NULL,
    PRIMARY KEY (chain_execution_id, position)
);

CREATE INDEX IF NOT EXISTS idx_executions_user ON agent_executions(user_id);
CREATE INDEX IF NOT EXISTS idx_executions_agent_type ON agent_executions(agent_type);
CREATE INDEX IF NOT EXISTS idx_executions_status ON agent_executions(status);
CREATE INDEX IF NOT EXISTS idx_executions_started ON agent_executions(started_at);
CREATE INDEX IF NOT EXISTS idx_executions_parent ON agent_executions(parent_execution_id);
CREATE INDEX IF NOT EXISTS idx_chain_executions_chain ON chain_executions(chain_id);
";
