//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::SwarmOptions;
use crate::orchestrator::SwarmReport;

/// 初始化 tracing 日志
///
/// 级别由 `RUST_LOG` 控制，默认 `info`。重复调用不会报错。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(options: &SwarmOptions, rule_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 多 Worker 频道整理模式");
    info!("📊 Worker 数量: {}", options.worker_count);
    info!("📄 起始页码: {}", options.start_page);
    info!("📋 规则数量: {}", rule_count);
    if options.dry_run {
        info!("🧪 试运行模式：只计算变更，不保存");
    }
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(report: &SwarmReport, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("👷 Worker: {}", report.workers);
    info!("📄 已处理页数: {}", report.totals.pages);
    info!("🔍 候选条目: {}", report.totals.candidates);
    info!("✅ 已更新: {}", report.totals.updated);
    info!("✓ 已是目标状态: {}", report.totals.already_correct);
    info!("🧪 试运行: {}", report.totals.dry_run);
    info!("➖ 编辑时未匹配: {}", report.totals.mismatched);
    info!("⚠️ 跳过: {}", report.totals.skipped);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 错误信息只取第一行（浏览器错误常附带很长的堆栈）
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
