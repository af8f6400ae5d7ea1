//! Zintel Gateway 服务主入口
//! 
//! 验证代理服务，转发文本预测、新闻和图片验证请求

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zintel_gateway::business::services::BackendProxy;
use zintel_gateway::infrastructure::ConfigOverrides;
use zintel_gateway::{create_routes, AppState, Config};

/// 命令行参数，只覆盖显式传入的值；环境变量由 `Config::load` 读取
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 监听地址
    #[arg(long)]
    host: Option<String>,

    /// 监听端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 外部ML后端地址
    #[arg(long)]
    backend_url: Option<String>,

    /// 构建好的前端静态文件目录
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

impl From<Cli> for ConfigOverrides {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            backend_url: cli.backend_url,
            static_dir: cli.static_dir,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志 - 默认INFO等级
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zintel_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("🚀 启动 Zintel Gateway 服务");

    // 加载配置
    let mut config = Config::load()?;
    config.apply_overrides(cli.into());
    config.validate()?;
    info!("✅ 配置加载成功");

    // 初始化后端代理
    let backend = Arc::new(BackendProxy::new(&config.backend)?);
    info!("✅ 后端代理初始化成功: {}", backend.origin());

    // 创建路由
    let state = AppState::new(backend, config.upload.clone());
    let app = create_routes(state, config.server.static_dir.clone());
    info!("✅ 路由创建成功");

    // 启动服务器
    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("🌐 服务器启动成功，监听: {}", bind_address);
    info!("📖 健康检查: http://{}/health", bind_address);

    axum::serve(listener, app)
        .tcp_nodelay(true)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("🛑 接收到关闭信号，正在优雅关闭服务器...");
        })
        .await?;

    Ok(())
}
