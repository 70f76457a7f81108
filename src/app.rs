use std::{future::Future, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use marketplace_api::{create_app, AppState};
use marketplace_application::{PaymentService, TaskLifecycleService, TaskService};
use marketplace_config::AppConfig;
use marketplace_infrastructure::{
    DatabaseManager, SqlitePaymentRepository, SqliteServiceRepository,
    SqliteSubmitTaskRepository, SqliteTaskRepository, SqliteUserRepository,
};
use tokio::net::TcpListener;
use tracing::info;

/// 主应用程序：数据库、服务和HTTP路由
pub struct Application {
    config: AppConfig,
    database: DatabaseManager,
    router: Router,
}

impl Application {
    /// 连接数据库、执行迁移并装配所有服务
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("初始化应用程序");

        let database = DatabaseManager::new(&config.database)
            .await
            .context("创建数据库连接池失败")?;
        database.migrate().await.context("数据库迁移失败")?;
        database.health_check().await?;

        let pool = database.pool().clone();
        let task_repo = Arc::new(SqliteTaskRepository::new(pool.clone()));
        let submit_task_repo = Arc::new(SqliteSubmitTaskRepository::new(pool.clone()));
        let user_repo = Arc::new(SqliteUserRepository::new(pool.clone()));
        let service_repo = Arc::new(SqliteServiceRepository::new(pool.clone()));
        let payment_repo = Arc::new(SqlitePaymentRepository::new(pool));

        let state = AppState {
            task_service: Arc::new(TaskService::new(
                task_repo.clone(),
                submit_task_repo.clone(),
                user_repo.clone(),
                service_repo,
            )),
            lifecycle_service: Arc::new(TaskLifecycleService::new(
                submit_task_repo,
                task_repo.clone(),
                user_repo,
            )),
            payment_service: Arc::new(PaymentService::new(task_repo, payment_repo)),
        };
        let router = create_app(state, &config.api);

        Ok(Self {
            config,
            database,
            router,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.database
    }

    /// 运行HTTP服务直到 `shutdown` 完成；绑定或服务失败时返回错误
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let bind_address = &self.config.api.bind_address;
        let listener = TcpListener::bind(bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {bind_address}"))?;

        info!("API服务器启动在 http://{}", listener.local_addr()?);

        axum::serve(listener, self.router.clone().into_make_service())
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("API服务器收到关闭信号");
            })
            .await
            .context("API服务器运行失败")?;

        self.database.close().await;
        info!("API服务器已停止");
        Ok(())
    }
}
