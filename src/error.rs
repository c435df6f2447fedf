//! 错误类型
//!
//! 分为三层：
//! - `InteractionError`：单次页面交互失败（点击、等待、读取），决定是否重试
//! - `SessionError`：会话的启动、登录状态加载、关闭
//! - `SwarmError`：启动集群时的前置检查
//!
//! 单个条目 / 单页的失败只在 Worker 内部记录，不会向上传播。

use thiserror::Error;

/// 页面交互错误
#[derive(Debug, Error)]
pub enum InteractionError {
    /// 元素引用失效、点击被遮挡或其他自动化故障，可重试
    #[error("交互暂时失败: {0}")]
    Transient(String),

    /// 等待元素出现超时
    #[error("等待元素超时: {selector}")]
    TimedOut { selector: String },

    /// 元素不存在
    #[error("未找到元素: {selector}")]
    NotFound { selector: String },

    /// 不可重试的错误（数据解析失败、会话已关闭等）
    #[error("交互失败: {0}")]
    Other(String),
}

impl InteractionError {
    /// 是否属于可重试的瞬时错误
    pub fn is_transient(&self) -> bool {
        !matches!(self, InteractionError::Other(_))
    }

    pub fn timed_out(selector: impl Into<String>) -> Self {
        InteractionError::TimedOut {
            selector: selector.into(),
        }
    }

    pub fn not_found(selector: impl Into<String>) -> Self {
        InteractionError::NotFound {
            selector: selector.into(),
        }
    }
}

impl From<chromiumoxide::error::CdpError> for InteractionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        InteractionError::Transient(err.to_string())
    }
}

impl From<serde_json::Error> for InteractionError {
    fn from(err: serde_json::Error) -> Self {
        InteractionError::Other(err.to_string())
    }
}

/// 会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 无法启动可用的浏览器后端
    #[error("无法启动浏览器会话: {0}")]
    Unavailable(String),

    /// 登录状态（cookies）加载失败
    #[error("登录状态加载失败: {0}")]
    AuthState(String),

    /// 关闭会话失败
    #[error("关闭会话失败: {0}")]
    Close(String),
}

/// 集群启动错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SwarmError {
    #[error("集群已在运行中")]
    AlreadyRunning,

    #[error("规则列表为空，请先添加规则")]
    NoRules,

    #[error("缺少登录状态，请先登录")]
    MissingAuthState,

    #[error("起始页码无效: {0}（页码从 1 开始）")]
    InvalidStartPage(u32),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 规则缺少目标频道
    #[error("第 {index} 条规则无效: {reason}")]
    InvalidRule { index: usize, reason: String },
}

/// 交互结果类型
pub type InteractionResult<T> = Result<T, InteractionError>;
