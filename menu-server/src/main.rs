use anyhow::Context;
use menu_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env 优先于默认值
    dotenv::dotenv().ok();
    let config = Config::from_env();

    // 2. 工作目录和日志
    setup_environment(&config).context("Failed to prepare work dir")?;
    print_banner();
    tracing::info!(environment = %config.environment, "🦀 Menu server starting...");

    // 3. 初始化服务器状态
    let state = ServerState::initialize(&config)
        .await
        .context("Failed to initialize server state")?;

    // 4. 启动 HTTP 服务器 (后台任务随之启动)
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
