use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::traits::{ensure_valid_params, DataSourceConnection, SupportsRawTables};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult, Statement};
use std::time::Instant;
use telehub_query::SqlQueryBuilder;
use telehub_types::{BackendKind, ConnectionInfo, ConnectionResult, DataPoint, QueryParams};
use tracing::{debug, info, warn};

/// 关系库连接（PostgreSQL / MySQL）
///
/// 组合 SQL 构建器和行映射，额外提供表结构发现能力；
/// 不实现聚合下推。
pub struct SqlConnection {
    info: ConnectionInfo,
    kind: BackendKind,
    builder: SqlQueryBuilder,
    db: DatabaseConnection,
}

impl SqlConnection {
    /// 建立数据库连接
    pub async fn connect(name: &str, kind: BackendKind, config: &DatabaseConfig) -> Result<Self> {
        let url = config.connection_url(kind);
        let db = Database::connect(&url).await?;

        info!(
            backend = %kind,
            host = %config.host,
            database = %config.database,
            "Connected to relational backend"
        );

        Ok(Self::with_database(name, kind, config, db))
    }

    /// 复用已建立的数据库连接
    pub fn with_database(
        name: &str,
        kind: BackendKind,
        config: &DatabaseConfig,
        db: DatabaseConnection,
    ) -> Self {
        let schema = config.schema.clone().unwrap_or_default();
        let info = ConnectionInfo::new(name, kind)
            .with_metadata("database", &config.database)
            .with_metadata("table", &schema.table);

        Self {
            info,
            kind,
            builder: SqlQueryBuilder::new(schema, Self::db_backend(kind)),
            db,
        }
    }

    fn db_backend(kind: BackendKind) -> DatabaseBackend {
        match kind {
            BackendKind::Mysql => DatabaseBackend::MySql,
            _ => DatabaseBackend::Postgres,
        }
    }

    /// 行按规范别名取值；值列兼容文本和数值两种物理类型
    fn point_from_row(row: &QueryResult) -> DataPoint {
        let value = row
            .try_get::<String>("", "value")
            .or_else(|_| row.try_get::<f64>("", "value").map(|v| v.to_string()))
            .or_else(|_| row.try_get::<i64>("", "value").map(|v| v.to_string()))
            .unwrap_or_default();

        let time = row
            .try_get::<DateTime<Utc>>("", "time")
            .unwrap_or_else(|_| Utc::now());

        DataPoint {
            time,
            collector_id: row.try_get::<String>("", "collector_id").unwrap_or_default(),
            gateway_id: row.try_get::<String>("", "gateway_id").unwrap_or_default(),
            equipment_id: row.try_get::<String>("", "equipment_id").unwrap_or_default(),
            tag_id: row.try_get::<String>("", "tag_id").unwrap_or_default(),
            value,
            aggregation_kind: None,
            time_window: None,
        }
    }
}

#[async_trait]
impl DataSourceConnection for SqlConnection {
    async fn test_connection(&self) -> ConnectionResult {
        let started = Instant::now();

        match self.db.execute(self.builder.build_test_query()).await {
            Ok(_) => ConnectionResult::success(
                format!("{} connection OK", self.kind),
                started.elapsed().as_millis() as u64,
            ),
            Err(e) => {
                warn!(error = %e, backend = %self.kind, "Relational connectivity test failed");
                ConnectionResult::failure(format!("{} connection failed: {}", self.kind, e))
            }
        }
    }

    async fn query_data(&self, params: &QueryParams) -> Result<Vec<DataPoint>> {
        ensure_valid_params(params)?;

        let stmt = self.builder.build_data_query(params);
        debug!(sql = %stmt.sql, "Running relational query");

        let rows = self.db.query_all(stmt).await?;
        let points = rows.iter().map(Self::point_from_row).collect::<Vec<_>>();

        debug!(count = points.len(), "Queried data points from relational backend");
        Ok(points)
    }

    fn connection_info(&self) -> ConnectionInfo {
        self.info.clone()
    }

    fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    fn as_raw_tables(&self) -> Option<&dyn SupportsRawTables> {
        Some(self)
    }
}

#[async_trait]
impl SupportsRawTables for SqlConnection {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let sql = match self.kind {
            BackendKind::Mysql => {
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = DATABASE() ORDER BY table_name"
            }
            _ => {
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = 'public' ORDER BY table_name"
            }
        };

        let rows = self
            .db
            .query_all(Statement::from_string(Self::db_backend(self.kind), sql.to_string()))
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.try_get::<String>("", "table_name").ok())
            .collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<String>> {
        let backend = Self::db_backend(self.kind);
        let sql = match backend {
            DatabaseBackend::MySql => {
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_name = ? AND table_schema = DATABASE() ORDER BY ordinal_position"
            }
            _ => {
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_name = $1 ORDER BY ordinal_position"
            }
        };

        let rows = self
            .db
            .query_all(Statement::from_sql_and_values(
                backend,
                sql,
                vec![table.to_string().into()],
            ))
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.try_get::<String>("", "column_name").ok())
            .collect())
    }
}
