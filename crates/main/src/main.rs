//! 主应用程序入口
//!
//! 加载配置、装配存储与服务，启动 Axum Web API 与 WebSocket 服务。

use config::AppConfig;
use infrastructure::{Infrastructure, InfrastructureConfig};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;

    let infra = Infrastructure::connect(InfrastructureConfig::from(&config)).await?;
    tracing::info!(backend = ?infra.backend, "storage ready");

    let state = AppState::new(&infra, &config);
    state.room_service.ensure_room(&config.default_room).await?;

    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("聊天室服务器启动在 http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在关闭");
}
