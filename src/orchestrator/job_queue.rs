//! 页码任务队列
//!
//! 所有 Worker 共享的 FIFO。`pop` 是原子的，同一个页码只会被取出一次；
//! `drain_all` 清空剩余任务，作为"已到末页"的广播：任何 Worker 取到空队列就直接退出。

use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};

/// 页码（从 1 开始）
pub type PageNumber = u32;

#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<PageNumber>>,
    notify: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用给定范围替换队列内容
    pub fn seed(&self, pages: RangeInclusive<PageNumber>) {
        {
            let mut jobs = self.lock();
            jobs.clear();
            jobs.extend(pages);
        }
        self.notify.notify_waiters();
    }

    /// 从 `start` 开始入队 `count` 个连续页码，超出 `u32` 的部分被截断
    pub fn seed_from(&self, start: PageNumber, count: u32) {
        match count.checked_sub(1) {
            Some(extra) => self.seed(start..=start.saturating_add(extra)),
            None => self.lock().clear(),
        }
    }

    /// 取出下一个页码；队列为空时最多等待 `timeout`，仍为空则返回 `None`
    pub async fn pop(&self, timeout: Duration) -> Option<PageNumber> {
        let deadline = Instant::now() + timeout;
        loop {
            // 先注册通知再检查队列，避免错过检查之后的 seed
            let notified = self.notify.notified();
            if let Some(page) = self.lock().pop_front() {
                return Some(page);
            }
            if timeout_at(deadline, notified).await.is_err() {
                return self.lock().pop_front();
            }
        }
    }

    /// 清空剩余任务，返回被移除的数量；重复调用是安全的
    pub fn drain_all(&self) -> usize {
        let mut jobs = self.lock();
        let removed = jobs.len();
        jobs.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PageNumber>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
