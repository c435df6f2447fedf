//! 集成测试共用的模拟站点和会话
//!
//! `FakeSite` 保存所有页面上的视频和可选频道，多个 `FakeSession` 共享同一个站点；
//! 每个会话自己记录当前页码、菜单、编辑表单和未保存的修改。
//! 选择器按 `Selectors::default()` 解释。

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use channel_swarm::config::{Selectors, SwarmSettings, Timings};
use channel_swarm::error::{InteractionError, InteractionResult, SessionError};
use channel_swarm::infrastructure::{Session, SessionProvider};
use channel_swarm::models::content_item::{format_tags, parse_tags};
use channel_swarm::models::{Rule, RuleSet};

pub const CONTENT_URL: &str = "fake://account/content?pg={page}";

/// 零等待的运行设置
pub fn settings(page_count: u32) -> SwarmSettings {
    SwarmSettings {
        content_url: CONTENT_URL.to_string(),
        page_count,
        selectors: Selectors::default(),
        timings: Timings::immediate(),
    }
}

pub fn podcast_rules() -> RuleSet {
    RuleSet::new(vec![Rule::new("podcast", "", "Channel A")])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeVideo {
    pub title: String,
    pub category: String,
    pub channel: String,
    pub tags: Vec<String>,
}

impl FakeVideo {
    pub fn new(title: &str, category: &str, channel: &str) -> Self {
        Self {
            title: title.to_string(),
            category: category.to_string(),
            channel: channel.to_string(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

#[derive(Default)]
struct SiteState {
    pages: BTreeMap<u32, Vec<FakeVideo>>,
    channels: Vec<String>,
    /// (页码, 条目位置) → 还要失败几次
    open_failures: HashMap<(u32, usize), usize>,
    navigations: Vec<u32>,
    saves: usize,
    writes: usize,
    auth_loads: usize,
    closed: usize,
    /// 每次导航 / 刷新 / 关闭额外耗时
    delay: Duration,
}

/// 模拟的内容管理站点
#[derive(Default)]
pub struct FakeSite {
    state: Mutex<SiteState>,
}

impl FakeSite {
    pub fn new(channels: &[&str]) -> Arc<Self> {
        let site = Self::default();
        site.lock().channels = channels.iter().map(|c| c.to_string()).collect();
        Arc::new(site)
    }

    pub fn add_page(&self, page: u32, videos: Vec<FakeVideo>) {
        self.lock().pages.insert(page, videos);
    }

    /// 让某个条目的前 `times` 次打开菜单失败
    pub fn fail_opens(&self, page: u32, index: usize, times: usize) {
        self.lock().open_failures.insert((page, index), times);
    }

    /// 让导航、刷新和关闭变慢，方便在运行中途停止
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = delay;
    }

    pub fn video(&self, page: u32, index: usize) -> FakeVideo {
        self.lock().pages[&page][index].clone()
    }

    pub fn page_len(&self, page: u32) -> usize {
        self.lock().pages.get(&page).map_or(0, Vec::len)
    }

    pub fn navigations(&self) -> Vec<u32> {
        self.lock().navigations.clone()
    }

    pub fn saves(&self) -> usize {
        self.lock().saves
    }

    /// `set_value` 调用次数
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    pub fn auth_loads(&self) -> usize {
        self.lock().auth_loads
    }

    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, SiteState> {
        self.state.lock().unwrap()
    }

    async fn slow_down(&self) {
        let delay = self.lock().delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Details,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeHandle {
    Marker(usize),
    Trigger(usize),
    EditAction,
    Form,
    Tab(Tab),
    TitleField,
    TagsField,
    CategoryChecked,
    ChannelChecked,
    ChannelSelect,
    ChannelOption(usize),
    SaveButton,
}

#[derive(Default)]
struct View {
    page: Option<u32>,
    menu: Option<usize>,
    form: Option<usize>,
    tab: Option<Tab>,
    draft_channel: Option<String>,
    draft_tags: Option<String>,
    closed: bool,
}

impl View {
    fn reset(&mut self) {
        self.menu = None;
        self.form = None;
        self.tab = None;
        self.draft_channel = None;
        self.draft_tags = None;
    }
}

/// 模拟会话
pub struct FakeSession {
    site: Arc<FakeSite>,
    selectors: Selectors,
    view: Mutex<View>,
}

impl FakeSession {
    pub fn new(site: Arc<FakeSite>) -> Self {
        Self {
            site,
            selectors: Selectors::default(),
            view: Mutex::new(View::default()),
        }
    }

    fn view(&self) -> MutexGuard<'_, View> {
        self.view.lock().unwrap()
    }

    fn videos_on_page(&self, page: Option<u32>) -> Vec<FakeVideo> {
        page.and_then(|p| self.site.lock().pages.get(&p).cloned())
            .unwrap_or_default()
    }

    fn open_video(&self, view: &View) -> InteractionResult<FakeVideo> {
        let (page, index) = match (view.page, view.form) {
            (Some(page), Some(index)) => (page, index),
            _ => return Err(InteractionError::Other("edit form is not open".into())),
        };
        self.videos_on_page(Some(page))
            .get(index)
            .cloned()
            .ok_or_else(|| InteractionError::Other("item disappeared".into()))
    }

    fn ensure_open(&self) -> InteractionResult<()> {
        if self.view().closed {
            return Err(InteractionError::Other("session closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Session for FakeSession {
    type Handle = FakeHandle;

    async fn navigate(&self, url: &str) -> InteractionResult<()> {
        self.ensure_open()?;
        let page = url
            .rsplit("pg=")
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(|| InteractionError::Other(format!("bad url: {}", url)))?;

        self.site.lock().navigations.push(page);
        self.site.slow_down().await;
        let mut view = self.view();
        view.reset();
        view.page = Some(page);
        Ok(())
    }

    async fn load_auth_state(&self, blob: &[u8]) -> Result<(), SessionError> {
        if blob.is_empty() {
            return Err(SessionError::AuthState("empty cookie blob".into()));
        }
        self.site.lock().auth_loads += 1;
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> InteractionResult<Vec<FakeHandle>> {
        self.ensure_open()?;
        let s = &self.selectors;
        let view = self.view();
        let count = self.videos_on_page(view.page).len();
        let form_open = view.form.is_some();
        let on_settings = form_open && view.tab == Some(Tab::Settings);

        let found: Vec<FakeHandle> = if selector == s.content_marker {
            (0..count).map(FakeHandle::Marker).collect()
        } else if selector == s.item_trigger {
            (0..count).map(FakeHandle::Trigger).collect()
        } else if selector == s.edit_action {
            view.menu.map(|_| FakeHandle::EditAction).into_iter().collect()
        } else if selector == s.edit_form {
            form_open.then_some(FakeHandle::Form).into_iter().collect()
        } else if selector == s.primary_tab {
            form_open.then_some(FakeHandle::Tab(Tab::Details)).into_iter().collect()
        } else if selector == s.secondary_tab {
            form_open.then_some(FakeHandle::Tab(Tab::Settings)).into_iter().collect()
        } else if selector == s.title_field {
            form_open.then_some(FakeHandle::TitleField).into_iter().collect()
        } else if selector == s.tags_field {
            form_open.then_some(FakeHandle::TagsField).into_iter().collect()
        } else if selector == Selectors::checked_option(&s.category_select) {
            form_open.then_some(FakeHandle::CategoryChecked).into_iter().collect()
        } else if selector == Selectors::checked_option(&s.channel_select) {
            on_settings.then_some(FakeHandle::ChannelChecked).into_iter().collect()
        } else if selector == Selectors::options(&s.channel_select) {
            if on_settings {
                (0..self.site.lock().channels.len())
                    .map(FakeHandle::ChannelOption)
                    .collect()
            } else {
                Vec::new()
            }
        } else if selector == s.channel_select {
            on_settings.then_some(FakeHandle::ChannelSelect).into_iter().collect()
        } else if selector == s.save_button {
            form_open.then_some(FakeHandle::SaveButton).into_iter().collect()
        } else {
            Vec::new()
        };
        Ok(found)
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> InteractionResult<FakeHandle> {
        self.find_all(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| InteractionError::timed_out(selector))
    }

    async fn click(&self, handle: &FakeHandle) -> InteractionResult<()> {
        self.ensure_open()?;
        let mut view = self.view();
        match handle {
            FakeHandle::Trigger(index) => {
                let page = view.page.unwrap_or_default();
                let mut site = self.site.lock();
                if let Some(remaining) = site.open_failures.get_mut(&(page, *index)) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Err(InteractionError::Transient(
                            "element click intercepted\nStacktrace: ...".into(),
                        ));
                    }
                }
                view.menu = Some(*index);
            }
            FakeHandle::EditAction => {
                view.form = view.menu.take();
                view.tab = Some(Tab::Details);
            }
            FakeHandle::Tab(tab) => view.tab = Some(*tab),
            FakeHandle::SaveButton => {
                let (Some(page), Some(index)) = (view.page, view.form) else {
                    return Err(InteractionError::Other("edit form is not open".into()));
                };
                let mut site = self.site.lock();
                let video = site
                    .pages
                    .get_mut(&page)
                    .and_then(|videos| videos.get_mut(index))
                    .ok_or_else(|| InteractionError::Other("item disappeared".into()))?;
                if let Some(channel) = view.draft_channel.take() {
                    video.channel = channel;
                }
                if let Some(tags) = view.draft_tags.take() {
                    video.tags = parse_tags(&tags);
                }
                site.saves += 1;
                view.reset();
            }
            _ => {}
        }
        Ok(())
    }

    async fn scroll_into_view(&self, _handle: &FakeHandle) -> InteractionResult<()> {
        self.ensure_open()
    }

    async fn get_attribute(&self, handle: &FakeHandle, name: &str) -> InteractionResult<String> {
        self.ensure_open()?;
        let view = self.view();
        let value = match (handle, name) {
            (FakeHandle::TitleField, "value") => self.open_video(&view)?.title,
            (FakeHandle::TagsField, "value") => match &view.draft_tags {
                Some(draft) => draft.clone(),
                None => format_tags(&self.open_video(&view)?.tags),
            },
            (FakeHandle::CategoryChecked, "textContent") => self.open_video(&view)?.category,
            (FakeHandle::ChannelChecked, "textContent") => match &view.draft_channel {
                Some(draft) => draft.clone(),
                None => self.open_video(&view)?.channel,
            },
            (FakeHandle::ChannelOption(i), "textContent") => {
                format!("  {}  ", self.site.lock().channels[*i])
            }
            (FakeHandle::ChannelOption(i), "value") => format!("ch-{}", i),
            _ => String::new(),
        };
        Ok(value)
    }

    async fn set_value(&self, handle: &FakeHandle, value: &str) -> InteractionResult<()> {
        self.ensure_open()?;
        let mut view = self.view();
        match handle {
            FakeHandle::ChannelSelect => {
                let index: usize = value
                    .strip_prefix("ch-")
                    .and_then(|i| i.parse().ok())
                    .ok_or_else(|| InteractionError::Other(format!("no option {}", value)))?;
                let channel = self.site.lock().channels[index].clone();
                view.draft_channel = Some(channel);
            }
            FakeHandle::TagsField => view.draft_tags = Some(value.to_string()),
            other => {
                return Err(InteractionError::Other(format!("not writable: {:?}", other)));
            }
        }
        self.site.lock().writes += 1;
        Ok(())
    }

    async fn refresh(&self) -> InteractionResult<()> {
        self.ensure_open()?;
        self.site.slow_down().await;
        self.view().reset();
        Ok(())
    }

    async fn read_item_titles(
        &self,
        _marker: &str,
        _title_selector: &str,
    ) -> InteractionResult<Vec<String>> {
        self.ensure_open()?;
        let page = self.view().page;
        Ok(self
            .videos_on_page(page)
            .into_iter()
            .map(|v| v.title)
            .collect())
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.site.slow_down().await;
        let mut view = self.view();
        if !view.closed {
            view.closed = true;
            self.site.lock().closed += 1;
        }
        Ok(())
    }
}

/// 模拟会话工厂，可以让前几次启动失败
pub struct FakeProvider {
    site: Arc<FakeSite>,
    failures_left: AtomicUsize,
    opened: AtomicUsize,
}

impl FakeProvider {
    pub fn new(site: Arc<FakeSite>) -> Self {
        Self::failing(site, 0)
    }

    pub fn failing(site: Arc<FakeSite>, failures: usize) -> Self {
        Self {
            site,
            failures_left: AtomicUsize::new(failures),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    type Session = FakeSession;

    async fn open(&self, _headless: bool) -> Result<FakeSession, SessionError> {
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(SessionError::Unavailable("no browser binary".into()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession::new(self.site.clone()))
    }
}
