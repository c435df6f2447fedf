//! 基于 chromiumoxide 的会话实现

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Page};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::{InteractionError, InteractionResult, SessionError};
use crate::infrastructure::js_executor::js_literal;
use crate::infrastructure::{JsExecutor, Session};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// 一个浏览器进程 + 一个页面
pub struct ChromiumSession {
    browser: Mutex<Option<Browser>>,
    handler: JoinHandle<()>,
    executor: JsExecutor,
    auth_url: String,
}

impl ChromiumSession {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, page: Page, auth_url: String) -> Self {
        Self {
            browser: Mutex::new(Some(browser)),
            handler,
            executor: JsExecutor::new(page),
            auth_url,
        }
    }

    fn page(&self) -> &Page {
        self.executor.page()
    }
}

#[async_trait]
impl Session for ChromiumSession {
    type Handle = Element;

    async fn navigate(&self, url: &str) -> InteractionResult<()> {
        debug!("导航到: {}", url);
        self.page().goto(url).await?;
        Ok(())
    }

    async fn load_auth_state(&self, blob: &[u8]) -> Result<(), SessionError> {
        let cookies: Vec<CookieParam> =
            serde_json::from_slice(blob).map_err(|e| SessionError::AuthState(e.to_string()))?;

        // cookies 只能写入当前域名，先打开站内任意页面
        self.page()
            .goto(self.auth_url.as_str())
            .await
            .map_err(|e| SessionError::AuthState(e.to_string()))?;

        let total = cookies.len();
        let mut loaded = 0;
        for cookie in cookies {
            match self.page().set_cookie(cookie).await {
                Ok(_) => loaded += 1,
                Err(e) => debug!("忽略无法写入的 cookie: {}", e),
            }
        }

        debug!("已加载 {}/{} 个 cookie", loaded, total);
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> InteractionResult<Vec<Element>> {
        Ok(self.page().find_elements(selector).await?)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> InteractionResult<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            // querySelectorAll 找不到时返回空列表，报错说明页面或连接本身出了问题
            if let Some(element) = first_match(self.page().find_elements(selector).await)? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(InteractionError::timed_out(selector));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, handle: &Element) -> InteractionResult<()> {
        // 用 JS 点击，不受遮罩层影响
        self.executor
            .call_on(handle, "function() { this.click(); }")
            .await?;
        Ok(())
    }

    async fn scroll_into_view(&self, handle: &Element) -> InteractionResult<()> {
        self.executor
            .call_on(
                handle,
                "function() { this.scrollIntoView({block: 'center'}); }",
            )
            .await?;
        Ok(())
    }

    async fn get_attribute(&self, handle: &Element, name: &str) -> InteractionResult<String> {
        let name = js_literal(name)?;
        let js_fn = format!(
            r#"function() {{
                const v = this[{name}];
                if (v === undefined || v === null) {{
                    return this.getAttribute({name}) || '';
                }}
                return String(v).trim();
            }}"#,
            name = name
        );

        self.executor.call_for_string(handle, js_fn).await
    }

    async fn set_value(&self, handle: &Element, value: &str) -> InteractionResult<()> {
        let js_fn = format!(
            r#"function() {{
                this.value = {};
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
            }}"#,
            js_literal(value)?
        );
        self.executor.call_on(handle, js_fn).await?;
        Ok(())
    }

    async fn refresh(&self) -> InteractionResult<()> {
        self.page().reload().await?;
        Ok(())
    }

    async fn read_item_titles(
        &self,
        marker: &str,
        title_selector: &str,
    ) -> InteractionResult<Vec<String>> {
        let js_code = format!(
            r#"
            (() => {{
                const clean = (s) => (s || '').replace(/\s+/g, ' ').trim();
                return Array.from(document.querySelectorAll({marker})).map((nav) => {{
                    const row = nav.closest('div.media-by-user') || nav.closest('tr') || nav.parentElement;
                    if (!row) {{
                        return '';
                    }}
                    const titleEl = row.querySelector({title});
                    return clean(titleEl ? titleEl.textContent : row.textContent);
                }});
            }})()
            "#,
            marker = js_literal(marker)?,
            title = js_literal(title_selector)?,
        );

        self.executor.eval_as::<Vec<String>>(js_code).await
    }

    async fn close(&self) -> Result<(), SessionError> {
        let browser = self.browser.lock().await.take();
        if let Some(mut browser) = browser {
            if let Err(e) = browser.close().await {
                warn!("关闭浏览器失败: {}", e);
                self.handler.abort();
                return Err(SessionError::Close(e.to_string()));
            }
            let _ = browser.wait().await;
        }
        self.handler.abort();
        Ok(())
    }
}

/// 取第一个匹配的元素；查询本身失败时不再重试
fn first_match<T, E: std::fmt::Display>(found: Result<Vec<T>, E>) -> InteractionResult<Option<T>> {
    match found {
        Ok(elements) => Ok(elements.into_iter().next()),
        Err(e) => Err(InteractionError::Other(e.to_string())),
    }
}
