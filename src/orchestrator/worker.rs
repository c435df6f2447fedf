//! Worker - 编排层
//!
//! 每个 Worker 独占一个会话，循环执行：
//!
//! ```text
//! Idle → Fetching(page) → Scanning → Dispatching(items) → Idle
//! ```
//!
//! 直到运行标志被清除、队列为空或被清空。打开某页后等不到内容标记，
//! 就认为已经翻过了最后一页：清空共享队列让其他 Worker 尽快退出，然后自己退出。
//! 其他 Worker 如果已经取到了更靠后的页码，会各自再发现一次同样的情况。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::config::SwarmSettings;
use crate::error::InteractionResult;
use crate::infrastructure::Session;
use crate::models::RuleSet;
use crate::orchestrator::job_queue::{JobQueue, PageNumber};
use crate::services::{page_scanner, LogSink};
use crate::utils::logging::{first_line, truncate_text};
use crate::workflow::{ActionExecutor, ItemCtx, ItemOutcome};

/// Worker 状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Fetching(PageNumber),
    Scanning(PageNumber),
    Dispatching { page: PageNumber, items: usize },
}

/// 单页处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    Processed,
    EndOfContent,
    Cancelled,
}

/// 单个 Worker 的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub pages: usize,
    pub candidates: usize,
    pub updated: usize,
    pub already_correct: usize,
    pub dry_run: usize,
    pub mismatched: usize,
    pub skipped: usize,
}

impl WorkerStats {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Updated => self.updated += 1,
            ItemOutcome::AlreadyCorrect => self.already_correct += 1,
            ItemOutcome::DryRun(_) => self.dry_run += 1,
            ItemOutcome::RuleMismatch => self.mismatched += 1,
            ItemOutcome::Skipped(_) => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: &WorkerStats) {
        self.pages += other.pages;
        self.candidates += other.candidates;
        self.updated += other.updated;
        self.already_correct += other.already_correct;
        self.dry_run += other.dry_run;
        self.mismatched += other.mismatched;
        self.skipped += other.skipped;
    }
}

/// Worker 运行所需的共享资源
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<JobQueue>,
    pub running: Arc<AtomicBool>,
    pub rules: RuleSet,
    pub settings: Arc<SwarmSettings>,
    pub log: Arc<LogSink>,
    pub dry_run: bool,
}

pub struct Worker<S: Session> {
    id: usize,
    session: Arc<S>,
    ctx: WorkerContext,
    state: WorkerState,
    stats: WorkerStats,
}

impl<S: Session> Worker<S> {
    pub fn new(id: usize, session: Arc<S>, ctx: WorkerContext) -> Self {
        Self {
            id,
            session,
            ctx,
            state: WorkerState::Idle,
            stats: WorkerStats::default(),
        }
    }

    /// 运行到队列耗尽或收到停止信号，返回统计
    pub async fn run(mut self) -> WorkerStats {
        while self.is_running() {
            let Some(page) = self.ctx.queue.pop(self.ctx.settings.timings.pop_timeout).await else {
                break;
            };

            self.ctx
                .log
                .info(format!("[W{}] 正在处理第 {} 页...", self.id, page));

            match self.process_page(page).await {
                Ok(PageOutcome::Processed) => self.stats.pages += 1,
                Ok(PageOutcome::Cancelled) => {
                    self.stats.pages += 1;
                    break;
                }
                Ok(PageOutcome::EndOfContent) => {
                    let removed = self.ctx.queue.drain_all();
                    self.ctx.log.info(format!(
                        "[W{}] 第 {} 页没有内容，停止本 Worker（清空剩余 {} 页）",
                        self.id, page, removed
                    ));
                    break;
                }
                Err(e) => {
                    let message = e.to_string();
                    self.ctx.log.error(format!(
                        "[W{}] 第 {} 页出错: {}",
                        self.id,
                        page,
                        first_line(&message)
                    ));
                }
            }
            self.transition(WorkerState::Idle);
        }

        self.transition(WorkerState::Idle);
        self.ctx.log.info(format!("[W{}] 已结束", self.id));
        self.stats
    }

    async fn process_page(&mut self, page: PageNumber) -> InteractionResult<PageOutcome> {
        let settings = self.ctx.settings.clone();
        let selectors = &settings.selectors;

        // Fetching
        self.transition(WorkerState::Fetching(page));
        self.session.navigate(&settings.page_url(page)).await?;
        if let Err(e) = self
            .session
            .wait_for(&selectors.content_marker, settings.timings.marker_wait)
            .await
        {
            debug!("[W{}] 第 {} 页等不到内容标记: {}", self.id, page, e);
            return Ok(PageOutcome::EndOfContent);
        }

        // Scanning
        self.transition(WorkerState::Scanning(page));
        let items = page_scanner::read_items(self.session.as_ref(), selectors).await?;
        let candidates = page_scanner::candidates(items, &self.ctx.rules);
        for item in &candidates {
            self.ctx.log.info(format!(
                "[W{}] [+] 命中: {}",
                self.id,
                truncate_text(&item.display_text, 40)
            ));
        }
        self.stats.candidates += candidates.len();

        if candidates.is_empty() {
            return Ok(PageOutcome::Processed);
        }

        // Dispatching
        self.transition(WorkerState::Dispatching {
            page,
            items: candidates.len(),
        });
        let executor = ActionExecutor::new(
            self.session.as_ref(),
            &self.ctx.rules,
            &settings,
            self.ctx.dry_run,
            &self.ctx.log,
        );
        for item in candidates {
            if !self.is_running() {
                return Ok(PageOutcome::Cancelled);
            }
            let item_ctx = ItemCtx::new(self.id, page, item);
            let outcome = executor.run(&item_ctx).await;
            debug!("{} 结果: {:?}", item_ctx, outcome);
            self.stats.record(&outcome);
        }

        Ok(PageOutcome::Processed)
    }

    fn is_running(&self) -> bool {
        self.ctx.running.load(Ordering::Relaxed)
    }

    fn transition(&mut self, next: WorkerState) {
        if self.state != next {
            debug!("[W{}] {:?} → {:?}", self.id, self.state, next);
            self.state = next;
        }
    }
}
