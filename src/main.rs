use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use channel_swarm::config::Config;
use channel_swarm::infrastructure::{Session, SessionProvider};
use channel_swarm::models::{
    load_auth_state, load_channel_cache, load_rules, save_channel_cache, RuleSet,
};
use channel_swarm::utils::logging;
use channel_swarm::workflow::fetch_channels;
use channel_swarm::{ChromiumProvider, LogSink, SwarmCoordinator};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("channels") => {
            let refresh = args.iter().any(|a| a == "--refresh");
            list_channels(&config, refresh).await
        }
        _ => run_swarm(config).await,
    }
}

/// 运行集群直到处理完成或收到 Ctrl-C
async fn run_swarm(config: Config) -> Result<()> {
    let rules = RuleSet::new(load_rules(&config.rules_file).await?);
    let auth_state = load_auth_state(&config.auth_file).await?;

    let options = config.swarm_options();
    logging::log_startup(&options, rules.len());

    let log = Arc::new(LogSink::with_file(&config.output_log_file)?);
    let coordinator = SwarmCoordinator::new(
        ChromiumProvider::from_config(&config),
        config.swarm_settings(),
        log,
    );

    coordinator
        .start_swarm(options, rules, auth_state)
        .await
        .context("无法启动集群")?;

    let stopper = coordinator.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到 Ctrl-C，正在停止...");
            stopper.stop();
        }
    });

    // 等待自然结束；Ctrl-C 只清除运行标志，这里负责回收会话
    let report = coordinator.wait().await;
    coordinator.shutdown().await;

    logging::print_final_stats(&report, &config.output_log_file);
    Ok(())
}

/// 列出可选的频道；有缓存时直接使用，`--refresh` 强制从页面重新读取
async fn list_channels(config: &Config, refresh: bool) -> Result<()> {
    let mut channels = if refresh {
        Vec::new()
    } else {
        load_channel_cache(&config.channels_file).await?
    };

    if channels.is_empty() {
        let auth_state = load_auth_state(&config.auth_file)
            .await?
            .context("缺少登录状态，请先登录")?;

        let provider = ChromiumProvider::from_config(config);
        let session = provider.open(config.headless).await?;
        session.load_auth_state(&auth_state).await?;

        let fetched = fetch_channels(&session, &config.swarm_settings()).await;
        if let Err(e) = session.close().await {
            warn!("关闭会话失败: {}", e);
        }
        channels = fetched?;
        save_channel_cache(&config.channels_file, &channels).await?;
    }

    for channel in &channels {
        info!("  - {}", channel);
    }
    Ok(())
}
