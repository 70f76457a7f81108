use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Arg, Command};
use marketplace::Application;
use marketplace_config::{AppConfig, LogConfig, OutputFormat};
use tokio::{signal, sync::oneshot};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("marketplace")
        .version(env!("CARGO_PKG_VERSION"))
        .about("任务市场后端服务")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，未指定时依次查找默认位置"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty"]),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDR")
                .help("HTTP监听地址，覆盖配置文件"),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config");

    let mut config = AppConfig::load(config_path.map(String::as_str)).with_context(|| {
        format!(
            "加载配置失败: {}",
            config_path.map(String::as_str).unwrap_or("<默认路径>")
        )
    })?;

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.logging.format = format.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(bind) = matches.get_one::<String>("bind") {
        config.api.bind_address = bind.clone();
    }

    init_logging(&config.logging)?;

    info!("启动任务市场服务");
    if let Some(path) = config_path {
        info!("配置文件: {path}");
    }
    info!("数据库: {}", config.database.url);

    let app = Application::new(config).await?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server = app.run(async move {
        let _ = shutdown_rx.await;
    });
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.context("应用运行失败")?;
            bail!("API服务器意外退出");
        }
        signal = wait_for_shutdown_signal() => {
            signal?;
            info!("收到关闭信号，开始优雅关闭...");
            let _ = shutdown_tx.send(());
        }
    }

    match tokio::time::timeout(Duration::from_secs(30), &mut server).await {
        Ok(result) => {
            result.context("应用关闭时发生错误")?;
            info!("应用已优雅关闭");
        }
        Err(_) => warn!("应用关闭超时，强制退出"),
    }

    info!("任务市场服务已退出");
    Ok(())
}

/// 初始化日志系统，`RUST_LOG` 优先于配置
fn init_logging(config: &LogConfig) -> Result<()> {
    let directives = match &config.directives {
        Some(extra) if !extra.is_empty() => format!("{},{}", config.level, extra),
        _ => config.level.to_string(),
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        OutputFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .context("初始化JSON日志格式失败")?,
        OutputFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .context("初始化Pretty日志格式失败")?,
    }

    Ok(())
}

/// 等待 Ctrl+C 或 SIGTERM
async fn wait_for_shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("安装Ctrl+C信号处理器失败") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("安装SIGTERM信号处理器失败")?
            .recv()
            .await;
        Ok::<(), anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            info!("收到Ctrl+C信号");
        },
        result = terminate => {
            result?;
            info!("收到SIGTERM信号");
        },
    }
    Ok(())
}
