//! 会话抽象
//!
//! 一个会话就是一个已登录、可导航的浏览器代理，整个生命周期只绑定一个 Worker。
//! 编排层只通过这里的能力驱动页面，具体实现见 `browser::chromium`。

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{InteractionResult, SessionError};

/// 会话能力
#[async_trait]
pub trait Session: Send + Sync {
    /// 元素句柄，刷新页面后失效
    type Handle: Send + Sync;

    /// 打开指定 URL
    async fn navigate(&self, url: &str) -> InteractionResult<()>;

    /// 加载登录状态（cookies）
    async fn load_auth_state(&self, blob: &[u8]) -> Result<(), SessionError>;

    /// 查找所有匹配的元素，没有时返回空列表
    async fn find_all(&self, selector: &str) -> InteractionResult<Vec<Self::Handle>>;

    /// 等待元素出现，超时返回 `InteractionError::TimedOut`
    async fn wait_for(&self, selector: &str, timeout: Duration) -> InteractionResult<Self::Handle>;

    async fn click(&self, handle: &Self::Handle) -> InteractionResult<()>;

    async fn scroll_into_view(&self, handle: &Self::Handle) -> InteractionResult<()>;

    /// 读取元素属性，优先读 DOM property（`value`、`textContent`），不存在时返回空串
    async fn get_attribute(&self, handle: &Self::Handle, name: &str) -> InteractionResult<String>;

    /// 写入输入框或下拉框的值，并触发 change 事件
    async fn set_value(&self, handle: &Self::Handle, value: &str) -> InteractionResult<()>;

    async fn refresh(&self) -> InteractionResult<()>;

    /// 读取当前页面每个条目的标题文本
    ///
    /// 每个 `marker` 元素对应一个条目，按页面顺序返回；条目行内找不到
    /// `title_selector` 时退回整行文本。
    async fn read_item_titles(
        &self,
        marker: &str,
        title_selector: &str,
    ) -> InteractionResult<Vec<String>>;

    async fn close(&self) -> Result<(), SessionError>;
}

/// 会话工厂
#[async_trait]
pub trait SessionProvider: Send + Sync + 'static {
    type Session: Session + 'static;

    /// 启动一个新会话，没有可用的浏览器后端时返回 `SessionError::Unavailable`
    async fn open(&self, headless: bool) -> Result<Self::Session, SessionError>;
}
