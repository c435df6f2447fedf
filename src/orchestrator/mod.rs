//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责并发调度和生命周期管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `swarm` - 集群协调器
//! - 启动前检查（已在运行、规则、登录状态、起始页码）
//! - 入队页码，依次启动会话
//! - 每个 Worker 一个 tokio 任务
//! - 停止 / 关闭，汇总统计
//!
//! ### `worker` - Worker
//! - 独占一个会话，从队列取页码
//! - 打开页面 → 扫描候选 → 逐个交给 ActionExecutor
//! - 发现末页时清空共享队列
//!
//! ### `job_queue` - 页码队列
//! - 所有 Worker 共享，原子取出，可清空
//!
//! ## 层次关系
//!
//! ```text
//! swarm (管理 N 个 Worker)
//!     ↓
//! worker (处理页码队列)
//!     ↓
//! workflow::ActionExecutor (处理单个条目)
//!     ↓
//! services (能力层：rule_engine / page_scanner / log_sink)
//!     ↓
//! infrastructure (基础设施：Session)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有会话，会话不在 Worker 之间共享
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做匹配和差异判断

pub mod job_queue;
pub mod swarm;
pub mod worker;

// 重新导出主要类型
pub use job_queue::{JobQueue, PageNumber};
pub use swarm::{SwarmCoordinator, SwarmReport, SwarmStatus};
pub use worker::{Worker, WorkerContext, WorkerState, WorkerStats};
