use crate::db::models::{DbIntegrationConfig, IntegrationCreate};
use crate::db::schema::SQLITE_INIT;
use crate::error::BridgeError;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::info;

#[derive(Debug)]
pub enum DbActorMessage {
    /// Create an integration configuration and return its id.
    Create(IntegrationCreate, RpcReplyPort<Result<i64, BridgeError>>),

    /// Get an active integration by id.
    GetById(i64, RpcReplyPort<Result<DbIntegrationConfig, BridgeError>>),

    /// List active integrations (status=1).
    ListActive(RpcReplyPort<Result<Vec<DbIntegrationConfig>, BridgeError>>),

    /// Soft-delete an integration by id (status=0).
    Deactivate(i64, RpcReplyPort<Result<(), BridgeError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn create(&self, create: IntegrationCreate) -> Result<i64, BridgeError> {
        ractor::call!(self.actor, DbActorMessage::Create, create)
            .map_err(|e| BridgeError::Ractor(format!("DbActor Create RPC failed: {e}")))?
    }

    pub async fn get_by_id(&self, id: i64) -> Result<DbIntegrationConfig, BridgeError> {
        ractor::call!(self.actor, DbActorMessage::GetById, id)
            .map_err(|e| BridgeError::Ractor(format!("DbActor GetById RPC failed: {e}")))?
    }

    pub async fn list_active(&self) -> Result<Vec<DbIntegrationConfig>, BridgeError> {
        ractor::call!(self.actor, DbActorMessage::ListActive)
            .map_err(|e| BridgeError::Ractor(format!("DbActor ListActive RPC failed: {e}")))?
    }

    pub async fn deactivate(&self, id: i64) -> Result<(), BridgeError> {
        ractor::call!(self.actor, DbActorMessage::Deactivate, id)
            .map_err(|e| BridgeError::Ractor(format!("DbActor Deactivate RPC failed: {e}")))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::Create(create, reply) => {
                let res = self.create_integration(&state.pool, create).await;
                let _ = reply.send(res);
            }
            DbActorMessage::GetById(id, reply) => {
                let res = self.get_by_id(&state.pool, id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ListActive(reply) => {
                let res = self.list_active(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Deactivate(id, reply) => {
                let res = self.deactivate(&state.pool, id).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn create_integration(
        &self,
        pool: &SqlitePool,
        create: IntegrationCreate,
    ) -> Result<i64, BridgeError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
        INSERT INTO integration_configs (
            platform, alchemy_config, platform_connection, field_mappings, status, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, 1, ?, ?)
        RETURNING id
        "#,
        )
        .bind(create.platform)
        .bind(create.alchemy_config)
        .bind(create.platform_connection)
        .bind(create.field_mappings)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    async fn get_by_id(
        &self,
        pool: &SqlitePool,
        id: i64,
    ) -> Result<DbIntegrationConfig, BridgeError> {
        let row = sqlx::query_as::<_, DbIntegrationConfig>(
            r#"
        SELECT id, platform, alchemy_config, platform_connection, field_mappings, status, created_at, updated_at
        FROM integration_configs
        WHERE id = ? AND status = 1
        "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.ok_or(BridgeError::IntegrationNotFound(id))
    }

    async fn list_active(&self, pool: &SqlitePool) -> Result<Vec<DbIntegrationConfig>, BridgeError> {
        let rows = sqlx::query_as::<_, DbIntegrationConfig>(
            r#"
        SELECT id, platform, alchemy_config, platform_connection, field_mappings, status, created_at, updated_at
        FROM integration_configs
        WHERE status = 1
        ORDER BY id
        "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    async fn deactivate(&self, pool: &SqlitePool, id: i64) -> Result<(), BridgeError> {
        let now = Utc::now();
        let res = sqlx::query(
            r#"
        UPDATE integration_configs
        SET status = 0, updated_at = ?
        WHERE id = ? AND status = 1
        "#,
        )
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(BridgeError::IntegrationNotFound(id));
        }
        Ok(())
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> DbActorHandle {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .expect("failed to spawn DbActor");

    DbActorHandle { actor }
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), BridgeError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
