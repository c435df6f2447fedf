use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::chromium::ChromiumSession;
use crate::config::Config;
use crate::error::SessionError;
use crate::infrastructure::SessionProvider;

/// 启动本地 Chromium 的会话工厂
#[derive(Clone, Debug)]
pub struct ChromiumProvider {
    chrome_executable: Option<PathBuf>,
    auth_url: String,
}

impl ChromiumProvider {
    pub fn new(chrome_executable: Option<PathBuf>, auth_url: impl Into<String>) -> Self {
        Self {
            chrome_executable,
            auth_url: auth_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.chrome_executable.clone(), config.auth_url.clone())
    }

    fn browser_config(&self, headless: bool) -> Result<BrowserConfig, SessionError> {
        let mut builder = BrowserConfig::builder();

        builder = if headless {
            builder
                .new_headless_mode()
                .arg("--blink-settings=imagesEnabled=false")
        } else {
            builder.with_head()
        };

        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder
            .args(vec![
                "--start-maximized",
                "--disable-popup-blocking",
                "--disable-gpu",
                "--disable-dev-shm-usage",
            ])
            .build()
            .map_err(|e| {
                error!("配置浏览器失败: {}", e);
                SessionError::Unavailable(e)
            })
    }
}

#[async_trait]
impl SessionProvider for ChromiumProvider {
    type Session = ChromiumSession;

    async fn open(&self, headless: bool) -> Result<ChromiumSession, SessionError> {
        info!("🚀 启动浏览器 (无头模式: {})...", headless);

        let config = self.browser_config(headless)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动浏览器失败: {}", e);
            SessionError::Unavailable(e.to_string())
        })?;
        debug!("浏览器启动成功");

        // 在后台处理浏览器事件
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // 等待浏览器状态同步
        sleep(tokio::time::Duration::from_millis(300)).await;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                error!("创建页面失败: {}", e);
                handler_task.abort();
                return Err(SessionError::Unavailable(e.to_string()));
            }
        };

        Ok(ChromiumSession::new(
            browser,
            handler_task,
            page,
            self.auth_url.clone(),
        ))
    }
}
