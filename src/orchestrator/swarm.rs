//! 集群协调器 - 编排层
//!
//! ## 职责
//!
//! 1. **启动检查**：已在运行、没有规则、没有登录状态时拒绝启动
//! 2. **任务入队**：以起始页码为起点，入队连续的页码
//! 3. **会话管理**：依次启动会话并加载登录状态；单个会话启动失败只少一个 Worker
//! 4. **并发执行**：每个 Worker 一个 tokio 任务，独占一个会话
//! 5. **停止协议**：清除本次运行的标志，Worker 在下一页 / 下一个条目前自行退出；
//!    每次启动都有自己的标志，上一次运行收尾时不会影响下一次
//! 6. **资源释放**：运行结束后关闭本次启动的所有会话
//! 7. **全局统计**：汇总所有 Worker 的结果

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::config::{SwarmOptions, SwarmSettings};
use crate::error::SwarmError;
use crate::infrastructure::{Session, SessionProvider};
use crate::models::RuleSet;
use crate::orchestrator::job_queue::JobQueue;
use crate::orchestrator::worker::{Worker, WorkerContext, WorkerStats};
use crate::services::LogSink;

/// 集群状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwarmStatus {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwarmReport {
    /// 实际启动的 Worker 数量
    pub workers: usize,
    pub totals: WorkerStats,
}

/// 集群协调器
///
/// 克隆开销很小，克隆出的句柄控制的是同一个集群（例如交给 Ctrl-C 处理任务调用 `stop`）。
pub struct SwarmCoordinator<P: SessionProvider> {
    inner: Arc<Inner<P>>,
}

impl<P: SessionProvider> Clone for SwarmCoordinator<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<P: SessionProvider> {
    provider: P,
    settings: Arc<SwarmSettings>,
    queue: Arc<JobQueue>,
    /// 当前这次运行的标志
    running: StdMutex<Arc<AtomicBool>>,
    log: Arc<LogSink>,
    status: watch::Sender<SwarmStatus>,
    sessions: StdMutex<Vec<Arc<P::Session>>>,
    supervisor: Mutex<Option<JoinHandle<SwarmReport>>>,
}

impl<P: SessionProvider> SwarmCoordinator<P> {
    pub fn new(provider: P, settings: SwarmSettings, log: Arc<LogSink>) -> Self {
        let (status, _) = watch::channel(SwarmStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                provider,
                settings: Arc::new(settings),
                queue: Arc::new(JobQueue::new()),
                running: StdMutex::new(Arc::new(AtomicBool::new(false))),
                log,
                status,
                sessions: StdMutex::new(Vec::new()),
                supervisor: Mutex::new(None),
            }),
        }
    }

    pub fn queue(&self) -> &JobQueue {
        &self.inner.queue
    }

    pub fn log(&self) -> &LogSink {
        &self.inner.log
    }

    pub fn is_running(&self) -> bool {
        self.inner.current_run().load(Ordering::SeqCst)
    }

    /// 订阅状态变化
    pub fn status(&self) -> watch::Receiver<SwarmStatus> {
        self.inner.status.subscribe()
    }

    /// 当前仍打开的会话数
    pub fn live_sessions(&self) -> usize {
        lock_or_recover(&self.inner.sessions).len()
    }

    /// 启动集群
    ///
    /// 检查通过后立即返回，会话启动和 Worker 运行都在后台进行；
    /// 用 `wait` 等待结束并取得统计。
    pub async fn start_swarm(
        &self,
        options: SwarmOptions,
        rules: RuleSet,
        auth_state: Option<Vec<u8>>,
    ) -> Result<(), SwarmError> {
        let auth_state = auth_state.ok_or(SwarmError::MissingAuthState)?;
        if rules.is_empty() {
            return Err(SwarmError::NoRules);
        }
        if options.start_page == 0 {
            return Err(SwarmError::InvalidStartPage(options.start_page));
        }

        let mut supervisor = self.inner.supervisor.lock().await;
        // 已经 stop 但 Worker 还没退完，也算仍在运行
        let unfinished = supervisor.as_ref().is_some_and(|h| !h.is_finished());
        if unfinished || self.is_running() {
            return Err(SwarmError::AlreadyRunning);
        }
        // 上一次运行已结束但还没有被 wait 回收
        if let Some(previous) = supervisor.take() {
            let _ = previous.await;
        }

        let running = Arc::new(AtomicBool::new(true));
        *lock_or_recover(&self.inner.running) = running.clone();

        self.inner
            .queue
            .seed_from(options.start_page, self.inner.settings.page_count);
        self.inner.status.send_replace(SwarmStatus::Running);

        let inner = self.inner.clone();
        *supervisor = Some(tokio::spawn(async move {
            inner.run(running, options, rules, auth_state).await
        }));
        Ok(())
    }

    /// 请求停止，Worker 在下一个检查点退出；已点击的保存不会回滚
    pub fn stop(&self) {
        if self.inner.current_run().swap(false, Ordering::SeqCst) {
            self.inner.status.send_replace(SwarmStatus::Stopping);
            self.inner.log.info("正在停止集群...");
        }
    }

    /// 等待本次运行结束，没有正在进行的运行时返回空统计
    pub async fn wait(&self) -> SwarmReport {
        let handle = self.inner.supervisor.lock().await.take();
        match handle {
            Some(handle) => match handle.await {
                Ok(report) => report,
                Err(e) => {
                    self.inner.log.error(format!("集群任务异常结束: {}", e));
                    self.inner.current_run().store(false, Ordering::SeqCst);
                    self.inner.status.send_replace(SwarmStatus::Stopped);
                    SwarmReport::default()
                }
            },
            None => SwarmReport::default(),
        }
    }

    /// 停止、等待结束，并关闭所有仍打开的会话
    pub async fn shutdown(&self) -> SwarmReport {
        self.stop();
        let report = self.wait().await;
        self.inner.close_sessions().await;
        report
    }
}

impl<P: SessionProvider> Inner<P> {
    fn current_run(&self) -> Arc<AtomicBool> {
        lock_or_recover(&self.running).clone()
    }

    async fn run(
        self: Arc<Self>,
        running: Arc<AtomicBool>,
        options: SwarmOptions,
        rules: RuleSet,
        auth_state: Vec<u8>,
    ) -> SwarmReport {
        let sessions = self.open_sessions(&running, &options, &auth_state).await;

        let mut report = SwarmReport {
            workers: sessions.len(),
            ..Default::default()
        };

        if sessions.is_empty() {
            self.log.warn("没有可用的 Worker，集群结束");
        } else if running.load(Ordering::SeqCst) {
            self.log.info("所有 Worker 已就绪，开始处理");

            let ctx = WorkerContext {
                queue: self.queue.clone(),
                running: running.clone(),
                rules,
                settings: self.settings.clone(),
                log: self.log.clone(),
                dry_run: options.dry_run,
            };

            let handles: Vec<_> = sessions
                .iter()
                .enumerate()
                .map(|(i, session)| {
                    let worker = Worker::new(i + 1, session.clone(), ctx.clone());
                    (i + 1, tokio::spawn(worker.run()))
                })
                .collect();

            for (worker_id, handle) in handles {
                match handle.await {
                    Ok(stats) => report.totals.merge(&stats),
                    Err(e) => self
                        .log
                        .error(format!("[W{}] 任务执行失败: {}", worker_id, e)),
                }
            }
        }

        self.release(&sessions).await;

        running.store(false, Ordering::SeqCst);
        self.status.send_replace(SwarmStatus::Stopped);
        self.log.info(format!(
            "集群已停止：处理 {} 页，更新 {} 个，跳过 {} 个",
            report.totals.pages, report.totals.updated, report.totals.skipped
        ));
        report
    }

    /// 依次启动会话，收到停止信号时提前结束
    async fn open_sessions(
        &self,
        running: &AtomicBool,
        options: &SwarmOptions,
        auth_state: &[u8],
    ) -> Vec<Arc<P::Session>> {
        self.log.info(format!(
            "正在初始化 {} 个 Worker...（可能需要一些时间）",
            options.worker_count
        ));

        let mut opened = Vec::with_capacity(options.worker_count);
        for i in 0..options.worker_count {
            if !running.load(Ordering::SeqCst) {
                break;
            }

            match self.provider.open(options.headless).await {
                Ok(session) => {
                    if let Err(e) = session.load_auth_state(auth_state).await {
                        self.log
                            .warn(format!("  Worker {} 登录状态加载失败: {}", i + 1, e));
                    }
                    let session = Arc::new(session);
                    lock_or_recover(&self.sessions).push(session.clone());
                    opened.push(session);
                    self.log.info(format!("  Worker {} 已就绪", i + 1));

                    if i + 1 < options.worker_count {
                        sleep(self.settings.timings.worker_stagger).await;
                    }
                }
                Err(e) => {
                    self.log
                        .error(format!("  Worker {} 启动失败: {}", i + 1, e));
                }
            }
        }
        opened
    }

    /// 关闭本次运行的会话
    async fn release(&self, sessions: &[Arc<P::Session>]) {
        for session in sessions {
            if let Err(e) = session.close().await {
                debug!("关闭会话失败: {}", e);
            }
        }
        lock_or_recover(&self.sessions)
            .retain(|live| !sessions.iter().any(|done| Arc::ptr_eq(live, done)));
    }

    async fn close_sessions(&self) {
        let remaining: Vec<_> = lock_or_recover(&self.sessions).drain(..).collect();
        for session in remaining {
            if let Err(e) = session.close().await {
                debug!("关闭会话失败: {}", e);
            }
        }
    }
}

fn lock_or_recover<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
