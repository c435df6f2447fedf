//! 日志汇集 - 业务能力层
//!
//! 所有 Worker 共用一个 `LogSink`。每一行在同一把锁内写入内存历史、
//! 日志文件和广播通道，保证不丢行、不串行；不同 Worker 之间的顺序不作保证。
//! 内存历史只保留最近 `HISTORY_CAPACITY` 行，协调器跨多次运行复用时不会无限增长。

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn, Level};

const CHANNEL_CAPACITY: usize = 1024;
pub const HISTORY_CAPACITY: usize = 10_000;

/// 日志汇集点
pub struct LogSink {
    inner: Mutex<SinkInner>,
    tx: broadcast::Sender<String>,
}

struct SinkInner {
    history: VecDeque<String>,
    file: Option<File>,
}

impl LogSink {
    /// 只写内存和广播
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(SinkInner {
                history: VecDeque::new(),
                file: None,
            }),
            tx,
        }
    }

    /// 同时追加写入日志文件，文件会被重建并写入表头
    pub fn with_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let log_header = format!(
            "{}\n频道整理日志 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        std::fs::write(path, log_header)
            .with_context(|| format!("无法创建日志文件: {}", path.display()))?;

        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .with_context(|| format!("无法打开日志文件: {}", path.display()))?;

        let sink = Self::new();
        sink.lock().file = Some(file);
        Ok(sink)
    }

    /// 订阅日志流（控制面板使用）
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// 最近的日志行（最多 `HISTORY_CAPACITY` 行），从旧到新
    pub fn lines(&self) -> Vec<String> {
        self.lock().history.iter().cloned().collect()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::INFO, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::WARN, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::ERROR, message.into());
    }

    fn log(&self, level: Level, line: String) {
        if level == Level::ERROR {
            error!("{}", line);
        } else if level == Level::WARN {
            warn!("{}", line);
        } else {
            info!("{}", line);
        }

        let mut inner = self.lock();
        if let Some(file) = inner.file.as_mut() {
            let stamped = format!(
                "[{}] {}\n",
                chrono::Local::now().format("%H:%M:%S"),
                line
            );
            if let Err(e) = file.write_all(stamped.as_bytes()) {
                debug!("写入日志文件失败: {}", e);
            }
        }
        // 没有订阅者时发送会失败，忽略即可
        let _ = self.tx.send(line.clone());
        if inner.history.len() == HISTORY_CAPACITY {
            inner.history.pop_front();
        }
        inner.history.push_back(line);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SinkInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}
