use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One stored integration configuration. Blob columns hold serialized JSON
/// the service does not interpret.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbIntegrationConfig {
    pub id: i64,
    pub platform: String,
    pub alchemy_config: String,
    pub platform_connection: String,
    pub field_mappings: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new integration configuration.
#[derive(Debug, Clone)]
pub struct IntegrationCreate {
    pub platform: String,
    pub alchemy_config: String,
    pub platform_connection: String,
    pub field_mappings: String,
}
