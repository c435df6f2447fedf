use crate::models::rule::Rule;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Default, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<Rule>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ChannelsFile {
    #[serde(default)]
    channels: Vec<String>,
}

/// 从 TOML 文件加载规则
///
/// 文件格式：
/// ```toml
/// [[rules]]
/// title = "podcast"
/// category = ""
/// target = "Channel A"
/// tags = ["talk", "weekly"]
/// ```
///
/// 目标频道为空的规则会被跳过，其余规则保持文件中的顺序。
pub async fn load_rules(path: impl AsRef<Path>) -> Result<Vec<Rule>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取规则文件: {}", path.display()))?;

    let file: RulesFile = toml::from_str(&content)
        .with_context(|| format!("无法解析规则文件: {}", path.display()))?;

    let mut rules = Vec::with_capacity(file.rules.len());
    for (index, rule) in file.rules.into_iter().enumerate() {
        match rule.normalized(index + 1) {
            Ok(rule) => rules.push(rule),
            Err(e) => tracing::warn!("跳过规则: {}", e),
        }
    }

    tracing::info!("成功加载 {} 条规则", rules.len());
    Ok(rules)
}

/// 加载缓存的频道列表，文件不存在时返回空列表
pub async fn load_channel_cache(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取频道缓存: {}", path.display()))?;
    let file: ChannelsFile = toml::from_str(&content)
        .with_context(|| format!("无法解析频道缓存: {}", path.display()))?;

    Ok(file.channels)
}

/// 保存频道列表
pub async fn save_channel_cache(path: impl AsRef<Path>, channels: &[String]) -> Result<()> {
    let path = path.as_ref();
    let file = ChannelsFile {
        channels: channels.to_vec(),
    };
    let content = toml::to_string(&file).context("无法序列化频道列表")?;
    fs::write(path, content)
        .await
        .with_context(|| format!("无法写入频道缓存: {}", path.display()))?;

    tracing::info!("已保存 {} 个频道", channels.len());
    Ok(())
}

/// 读取登录状态（cookies JSON），文件不存在时返回 None
pub async fn load_auth_state(path: impl AsRef<Path>) -> Result<Option<Vec<u8>>> {
    let path = path.as_ref();
    if !fs::try_exists(path).await.unwrap_or(false) {
        tracing::warn!("登录状态文件不存在: {}", path.display());
        return Ok(None);
    }

    let blob = fs::read(path)
        .await
        .with_context(|| format!("无法读取登录状态: {}", path.display()))?;
    Ok(Some(blob))
}
