//! # Channel Swarm
//!
//! 多 Worker 并发整理视频频道和标签的自动化工具
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 会话抽象，只暴露页面交互能力
//! - `Session` / `SessionProvider` - 编排层唯一依赖的浏览器接口
//! - `browser/` - 基于 chromiumoxide 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `rule_engine` - 规则匹配（第一条命中生效）
//! - `page_scanner` - 读取列表页并预筛选候选条目
//! - `LogSink` - 所有 Worker 共用的日志汇集点
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个条目"的完整处理流程
//! - `ItemCtx` - 上下文封装（worker + 页码 + 条目位置）
//! - `ActionExecutor` - 打开（带重试）→ 读取 → 匹配 → 差异 → 保存
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/swarm` - 集群协调器，管理会话和并发
//! - `orchestrator/worker` - Worker，遍历页码队列
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{ChromiumProvider, ChromiumSession};
pub use config::{Config, SwarmOptions, SwarmSettings};
pub use error::{InteractionError, SessionError, SwarmError};
pub use infrastructure::{Session, SessionProvider};
pub use models::{ContentItem, Rule, RuleSet};
pub use orchestrator::{SwarmCoordinator, SwarmReport, SwarmStatus};
pub use services::LogSink;
pub use workflow::{ActionExecutor, ItemCtx, ItemOutcome};
