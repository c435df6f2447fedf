//! 条目处理流程 - 流程层
//!
//! 核心职责：定义"一个条目"的完整处理流程
//!
//! 流程顺序：
//! 1. 刷新页面 → 按位置重新定位条目 → 打开编辑表单（瞬时错误最多重试 3 次）
//! 2. 读取标题、标签、分类，再切到设置页读取频道
//! 3. 用标题 + 分类重新匹配规则
//! 4. 计算差异，已是目标状态则不写入
//! 5. 试运行只记录日志；否则选择频道、覆盖标签、保存
//!
//! 第 2 步之后的任何错误都只导致跳过该条目。保存一旦点击就不会重试或回滚。

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::{Selectors, SwarmSettings};
use crate::error::{InteractionError, InteractionResult};
use crate::infrastructure::Session;
use crate::models::content_item::{format_tags, parse_tags};
use crate::models::{EditAttributes, Rule, RuleSet};
use crate::services::{rule_engine, LogSink};
use crate::utils::logging::{first_line, truncate_text};
use crate::workflow::item_ctx::ItemCtx;

/// 打开编辑表单的最大尝试次数
pub const MAX_OPEN_ATTEMPTS: usize = 3;

const ERROR_PREVIEW_LEN: usize = 120;
const SAVE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 条目处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// 已写入并保存
    Updated,
    /// 已是目标状态，没有写入
    AlreadyCorrect,
    /// 试运行，只计算了需要的变更
    DryRun(ChangePlan),
    /// 扫描时是候选，编辑时不再匹配
    RuleMismatch,
    /// 跳过
    Skipped(SkipReason),
}

/// 跳过原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 刷新后条目位置已超出列表
    OutOfRange,
    /// 重试后仍无法打开编辑表单
    OpenFailed,
    /// 下拉框中没有目标频道
    SelectionNotFound,
    /// 编辑表单内出错
    EditFailed,
}

/// 需要做的变更
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePlan {
    pub target_channel: String,
    pub target_tags: Vec<String>,
    pub needs_channel_change: bool,
    pub needs_tag_change: bool,
}

impl ChangePlan {
    /// 对比规则的目标状态和当前属性
    ///
    /// - 当前频道不包含目标频道（不区分大小写）时需要改频道
    /// - 规则带标签且与当前标签逐项不同（区分大小写和顺序）时需要改标签
    pub fn compute(rule: &Rule, attrs: &EditAttributes) -> Self {
        let needs_channel_change = !attrs
            .current_channel
            .to_lowercase()
            .contains(&rule.target_channel.to_lowercase());
        let needs_tag_change =
            !rule.target_tags.is_empty() && rule.target_tags != attrs.current_tags;

        Self {
            target_channel: rule.target_channel.clone(),
            target_tags: rule.target_tags.clone(),
            needs_channel_change,
            needs_tag_change,
        }
    }

    pub fn is_noop(&self) -> bool {
        !self.needs_channel_change && !self.needs_tag_change
    }
}

enum OpenOutcome {
    Opened,
    OutOfRange,
    Failed,
}

/// 条目处理流程
///
/// - 一次只处理一个条目
/// - 不持有会话，只借用 Worker 的会话
/// - 规则列表与扫描阶段是同一份快照
pub struct ActionExecutor<'a, S: Session> {
    session: &'a S,
    rules: &'a RuleSet,
    settings: &'a SwarmSettings,
    dry_run: bool,
    log: &'a LogSink,
}

impl<'a, S: Session> ActionExecutor<'a, S> {
    pub fn new(
        session: &'a S,
        rules: &'a RuleSet,
        settings: &'a SwarmSettings,
        dry_run: bool,
        log: &'a LogSink,
    ) -> Self {
        Self {
            session,
            rules,
            settings,
            dry_run,
            log,
        }
    }

    pub async fn run(&self, ctx: &ItemCtx) -> ItemOutcome {
        match self.open_with_retry(ctx).await {
            OpenOutcome::Opened => {}
            OpenOutcome::OutOfRange => {
                self.log
                    .info(format!("{} 页面内容已变化，条目不存在，跳过", ctx));
                return ItemOutcome::Skipped(SkipReason::OutOfRange);
            }
            OpenOutcome::Failed => {
                self.log.warn(format!(
                    "{} 无法打开条目 #{}，跳过",
                    ctx,
                    ctx.item.index + 1
                ));
                return ItemOutcome::Skipped(SkipReason::OpenFailed);
            }
        }

        match self.edit(ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = e.to_string();
                self.log.warn(format!(
                    "{} 编辑出错: {}",
                    ctx,
                    truncate_text(first_line(&message), ERROR_PREVIEW_LEN)
                ));
                ItemOutcome::Skipped(SkipReason::EditFailed)
            }
        }
    }

    // ========== 打开编辑表单 ==========

    async fn open_with_retry(&self, ctx: &ItemCtx) -> OpenOutcome {
        for attempt in 1..=MAX_OPEN_ATTEMPTS {
            match self.try_open(ctx.item.index).await {
                Ok(true) => return OpenOutcome::Opened,
                Ok(false) => return OpenOutcome::OutOfRange,
                Err(e) if e.is_transient() => {
                    debug!(
                        "{} 打开编辑表单失败 (尝试 {}/{}): {}",
                        ctx, attempt, MAX_OPEN_ATTEMPTS, e
                    );
                    if attempt < MAX_OPEN_ATTEMPTS {
                        sleep(self.settings.timings.retry_backoff).await;
                    }
                }
                Err(e) => {
                    debug!("{} 打开编辑表单出现不可重试的错误: {}", ctx, e);
                    return OpenOutcome::Failed;
                }
            }
        }
        OpenOutcome::Failed
    }

    /// 单次尝试，返回 `Ok(false)` 表示条目位置已超出列表
    async fn try_open(&self, index: usize) -> InteractionResult<bool> {
        let selectors = &self.settings.selectors;
        let timings = &self.settings.timings;

        // 每次都刷新，清掉上一次交互留下的遮罩层；旧句柄随之失效
        self.session.refresh().await?;
        self.session
            .wait_for(&selectors.content_marker, timings.refresh_wait)
            .await?;

        let mut triggers = self.session.find_all(&selectors.item_trigger).await?;
        if index >= triggers.len() {
            return Ok(false);
        }
        let trigger = triggers.swap_remove(index);

        self.session.scroll_into_view(&trigger).await?;
        sleep(timings.scroll_throttle).await;
        self.session.click(&trigger).await?;

        let edit = self
            .session
            .wait_for(&selectors.edit_action, timings.edit_wait)
            .await?;
        sleep(timings.edit_throttle).await;
        self.session.click(&edit).await?;

        self.session
            .wait_for(&selectors.edit_form, timings.edit_wait)
            .await?;
        Ok(true)
    }

    // ========== 编辑 ==========

    async fn edit(&self, ctx: &ItemCtx) -> InteractionResult<ItemOutcome> {
        let attrs = self.read_attributes().await?;

        let mut item = ctx.item.clone();
        item.attributes = Some(attrs);
        let Some(rule) = rule_engine::match_item(&item, self.rules) else {
            debug!("{} 编辑时未匹配任何规则，不做修改", ctx);
            return Ok(ItemOutcome::RuleMismatch);
        };
        let attrs = item.attributes.unwrap_or_default();

        let plan = ChangePlan::compute(rule, &attrs);
        let title = truncate_text(&attrs.title, 20);
        if plan.is_noop() {
            self.log
                .info(format!("{} ✓ '{}' 已是目标状态", ctx, title));
            return Ok(ItemOutcome::AlreadyCorrect);
        }

        self.log.info(format!(
            "{} -> 更新 '{}' 到 {}{}",
            ctx,
            title,
            plan.target_channel,
            if plan.needs_tag_change {
                format!("，标签: {}", format_tags(&plan.target_tags))
            } else {
                String::new()
            }
        ));

        if self.dry_run {
            self.log.info(format!("{} -> 试运行：跳过保存", ctx));
            return Ok(ItemOutcome::DryRun(plan));
        }

        self.apply(ctx, &plan).await
    }

    /// 主标签页读标题、标签、分类，设置页读频道；结束时停留在设置页
    async fn read_attributes(&self) -> InteractionResult<EditAttributes> {
        let selectors = &self.settings.selectors;

        let title_field = self.first(&selectors.title_field).await?;
        let title = self.session.get_attribute(&title_field, "value").await?;

        let current_tags = match self.optional(&selectors.tags_field).await? {
            Some(tags_field) => parse_tags(&self.session.get_attribute(&tags_field, "value").await?),
            None => Vec::new(),
        };

        let category = self
            .first(&Selectors::checked_option(&selectors.category_select))
            .await?;
        let current_category = self.session.get_attribute(&category, "textContent").await?;

        self.switch_tab(&selectors.secondary_tab).await?;

        let channel = self
            .first(&Selectors::checked_option(&selectors.channel_select))
            .await?;
        let current_channel = self.session.get_attribute(&channel, "textContent").await?;

        Ok(EditAttributes {
            title,
            current_tags,
            current_category,
            current_channel,
        })
    }

    async fn apply(&self, ctx: &ItemCtx, plan: &ChangePlan) -> InteractionResult<ItemOutcome> {
        let selectors = &self.settings.selectors;

        if plan.needs_channel_change && !self.select_channel(ctx, &plan.target_channel).await? {
            return Ok(ItemOutcome::Skipped(SkipReason::SelectionNotFound));
        }

        if plan.needs_tag_change {
            self.switch_tab(&selectors.primary_tab).await?;
            let tags_field = self.first(&selectors.tags_field).await?;
            self.session
                .set_value(&tags_field, &format_tags(&plan.target_tags))
                .await?;
        }

        let save = self.first(&selectors.save_button).await?;
        self.session.click(&save).await?;

        if self.wait_for_save().await {
            self.log.info(format!("{} ✓ 已保存", ctx));
        } else {
            self.log
                .warn(format!("{} 已点击保存，但编辑表单未关闭，结果未确认", ctx));
        }
        Ok(ItemOutcome::Updated)
    }

    /// 先按完整文本精确匹配，再退回不区分大小写的包含匹配
    async fn select_channel(&self, ctx: &ItemCtx, target: &str) -> InteractionResult<bool> {
        let select_selector = &self.settings.selectors.channel_select;
        let select = self.first(select_selector).await?;

        let mut options = Vec::new();
        for option in self
            .session
            .find_all(&Selectors::options(select_selector))
            .await?
        {
            let text = self.session.get_attribute(&option, "textContent").await?;
            let value = self.session.get_attribute(&option, "value").await?;
            options.push((text.trim().to_string(), value));
        }

        let wanted = target.trim();
        let wanted_lower = wanted.to_lowercase();
        let chosen = options
            .iter()
            .find(|(text, _)| text == wanted)
            .or_else(|| {
                options
                    .iter()
                    .find(|(text, _)| text.to_lowercase().contains(&wanted_lower))
            });

        match chosen {
            Some((text, value)) => {
                if text != wanted {
                    debug!("{} 频道 '{}' 模糊匹配到 '{}'", ctx, wanted, text);
                }
                self.session.set_value(&select, value).await?;
                Ok(true)
            }
            None => {
                self.log
                    .warn(format!("{} ⚠️ 未找到目标频道 '{}'，不做修改", ctx, wanted));
                Ok(false)
            }
        }
    }

    /// 等待编辑表单关闭；查询出错也视为未确认
    async fn wait_for_save(&self) -> bool {
        let form = &self.settings.selectors.edit_form;
        let deadline = Instant::now() + self.settings.timings.save_wait;
        loop {
            match self.session.find_all(form).await {
                Ok(found) if found.is_empty() => return true,
                Ok(_) => {}
                Err(e) => {
                    debug!("等待保存完成时出错: {}", e);
                    return false;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(SAVE_POLL_INTERVAL).await;
        }
    }

    // ========== 辅助方法 ==========

    async fn switch_tab(&self, selector: &str) -> InteractionResult<()> {
        let tab = self.first(selector).await?;
        self.session.click(&tab).await?;
        sleep(self.settings.timings.tab_switch).await;
        Ok(())
    }

    async fn first(&self, selector: &str) -> InteractionResult<S::Handle> {
        self.optional(selector)
            .await?
            .ok_or_else(|| InteractionError::not_found(selector))
    }

    async fn optional(&self, selector: &str) -> InteractionResult<Option<S::Handle>> {
        Ok(self.session.find_all(selector).await?.into_iter().next())
    }
}
