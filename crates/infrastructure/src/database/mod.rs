pub mod mapping;
pub mod sqlite;

pub use sqlite::{
    SqlitePaymentRepository, SqliteServiceRepository, SqliteSubmitTaskRepository,
    SqliteTaskRepository, SqliteUserRepository,
};

use anyhow::{Context, Result};
use marketplace_config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// 表结构，全部幂等。实体之间只按约定引用，不建外键
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL,
        image TEXT,
        role TEXT NOT NULL DEFAULT 'user',
        nid_status TEXT NOT NULL DEFAULT 'unsubmitted',
        created_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        service_type TEXT NOT NULL,
        price REAL,
        created_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        amount REAL NOT NULL,
        created_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        link TEXT NOT NULL,
        user_id TEXT NOT NULL,
        task_type TEXT NOT NULL,
        service_id TEXT NOT NULL,
        payment_id TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        timeline TEXT,
        quantity INTEGER,
        price REAL,
        image TEXT,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS submit_tasks (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        task_id TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        image TEXT,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_task_type ON tasks(task_type)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_submit_tasks_user_id ON submit_tasks(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_submit_tasks_status ON submit_tasks(status)",
    "CREATE INDEX IF NOT EXISTS idx_submit_tasks_created_at ON submit_tasks(created_at)",
];

pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let mut connect_options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("无效的数据库URL: {}", config.url))?
            .create_if_missing(true);
        if !config.is_in_memory() {
            connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
        }

        // 内存数据库每个连接都是独立的库，只能使用单连接
        let (max_connections, min_connections, idle_timeout) = if config.is_in_memory() {
            (1, 1, None)
        } else {
            (
                config.max_connections,
                config.min_connections,
                Some(Duration::from_secs(config.idle_timeout_seconds)),
            )
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(idle_timeout)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .context("连接数据库失败")?;

        info!("数据库连接池已创建: {}", config.url);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 创建缺失的表和索引
    pub async fn migrate(&self) -> Result<()> {
        run_migrations(&self.pool).await
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("数据库健康检查失败")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    debug!("Running SQLite database migrations");
    for statement in SCHEMA {
        sqlx::query(*statement)
            .execute(pool)
            .await
            .with_context(|| format!("执行迁移语句失败: {}", statement.trim()))?;
    }
    debug!("Successfully completed SQLite database migrations");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let manager = DatabaseManager::new(&memory_config()).await.unwrap();
        manager.migrate().await.unwrap();
        manager.migrate().await.unwrap();
        manager.health_check().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(manager.pool())
        .await
        .unwrap();
        for table in ["payments", "services", "submit_tasks", "tasks", "users"] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marketplace.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            ..Default::default()
        };

        let manager = DatabaseManager::new(&config).await.unwrap();
        manager.migrate().await.unwrap();
        manager.close().await;
        assert!(path.exists());
    }
}
