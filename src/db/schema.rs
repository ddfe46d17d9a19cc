//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema: one `integration_configs` table. The alchemy, platform
/// connection, and field-mapping columns are opaque JSON blobs; the service
/// treats this store as key/value.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS integration_configs (
    id INTEGER PRIMARY KEY NOT NULL,
    platform TEXT NOT NULL,
    alchemy_config TEXT NOT NULL,       -- JSON
    platform_connection TEXT NOT NULL,  -- JSON
    field_mappings TEXT NOT NULL,       -- JSON array
    status INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL  -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_integration_configs_status ON integration_configs(status);
"#;
