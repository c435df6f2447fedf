use std::path::PathBuf;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 起始页码
    pub start_page: u32,
    /// 每次运行入队的页数
    pub page_count: u32,
    /// 并发 Worker 数量
    pub worker_count: usize,
    /// 只计算变更，不保存
    pub dry_run: bool,
    /// 无头模式
    pub headless: bool,
    /// 规则文件（TOML）
    pub rules_file: String,
    /// 频道缓存文件（TOML）
    pub channels_file: String,
    /// 登录状态文件（cookies JSON）
    pub auth_file: String,
    /// 内容列表页 URL 模板，`{page}` 会被替换为页码
    pub content_url: String,
    /// 加载 cookies 前打开的页面
    pub auth_url: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 浏览器可执行文件路径，为空时自动查找
    pub chrome_executable: Option<PathBuf>,
}

pub const MAX_WORKERS: usize = 30;

impl Default for Config {
    fn default() -> Self {
        Self {
            start_page: 1,
            page_count: 150,
            worker_count: 4,
            dry_run: true,
            headless: true,
            rules_file: "rules.toml".to_string(),
            channels_file: "channels.toml".to_string(),
            auth_file: "cookies.json".to_string(),
            content_url: "https://rumble.com/account/content?&pg={page}".to_string(),
            auth_url: "https://rumble.com/404".to_string(),
            output_log_file: "swarm_log.txt".to_string(),
            chrome_executable: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            start_page: std::env::var("SWARM_START_PAGE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.start_page),
            page_count: std::env::var("SWARM_PAGE_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_count),
            worker_count: std::env::var("SWARM_WORKERS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.worker_count).clamp(1, MAX_WORKERS),
            dry_run: std::env::var("SWARM_DRY_RUN").ok().and_then(|v| v.parse().ok()).unwrap_or(default.dry_run),
            headless: std::env::var("SWARM_HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            rules_file: std::env::var("SWARM_RULES_FILE").unwrap_or(default.rules_file),
            channels_file: std::env::var("SWARM_CHANNELS_FILE").unwrap_or(default.channels_file),
            auth_file: std::env::var("SWARM_AUTH_FILE").unwrap_or(default.auth_file),
            content_url: std::env::var("SWARM_CONTENT_URL").unwrap_or(default.content_url),
            auth_url: std::env::var("SWARM_AUTH_URL").unwrap_or(default.auth_url),
            output_log_file: std::env::var("SWARM_LOG_FILE").unwrap_or(default.output_log_file),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from).or(default.chrome_executable),
        }
    }

    /// 单次运行的参数（相当于控制面板上的“启动”按钮）
    pub fn swarm_options(&self) -> SwarmOptions {
        SwarmOptions {
            start_page: self.start_page,
            worker_count: self.worker_count,
            dry_run: self.dry_run,
            headless: self.headless,
        }
    }

    /// 集群运行期间不变的设置
    pub fn swarm_settings(&self) -> SwarmSettings {
        SwarmSettings {
            content_url: self.content_url.clone(),
            page_count: self.page_count,
            selectors: Selectors::default(),
            timings: Timings::default(),
        }
    }
}

/// `startSwarm(startPage, workerCount, dryRun, headless)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwarmOptions {
    pub start_page: u32,
    pub worker_count: usize,
    pub dry_run: bool,
    pub headless: bool,
}

/// 集群运行设置
#[derive(Clone, Debug)]
pub struct SwarmSettings {
    pub content_url: String,
    pub page_count: u32,
    pub selectors: Selectors,
    pub timings: Timings,
}

impl SwarmSettings {
    /// 生成指定页码的 URL
    pub fn page_url(&self, page: u32) -> String {
        self.content_url.replace("{page}", &page.to_string())
    }
}

/// 页面元素选择器
#[derive(Clone, Debug)]
pub struct Selectors {
    /// 内容标记，每个条目一个；页面上没有它说明已经翻过了最后一页
    pub content_marker: String,
    /// 条目标题（在条目所在行内查找）
    pub item_title: String,
    /// 条目的操作菜单触发器
    pub item_trigger: String,
    /// 菜单中的“编辑”
    pub edit_action: String,
    /// 编辑表单
    pub edit_form: String,
    pub primary_tab: String,
    pub secondary_tab: String,
    pub title_field: String,
    pub tags_field: String,
    pub category_select: String,
    pub channel_select: String,
    pub save_button: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            content_marker: ".my-videos-nav".to_string(),
            item_title: "h3, .media-heading-name, .title".to_string(),
            item_trigger: ".my-videos-nav .open-menu".to_string(),
            edit_action: ".dd-menu[style*='block'] #edit".to_string(),
            edit_form: "#video-form".to_string(),
            primary_tab: "li[data-tab='details']".to_string(),
            secondary_tab: "li[data-tab='settings']".to_string(),
            title_field: "#title".to_string(),
            tags_field: "#tags".to_string(),
            category_select: "#siteChannelId".to_string(),
            channel_select: "#channelId".to_string(),
            save_button: ".overlay-dialog .buttons [id='0']".to_string(),
        }
    }
}

impl Selectors {
    /// 下拉框当前选中的选项
    pub fn checked_option(select: &str) -> String {
        format!("{} option:checked", select)
    }

    /// 下拉框的全部选项
    pub fn options(select: &str) -> String {
        format!("{} option", select)
    }
}

/// 等待时间与节流
#[derive(Clone, Debug)]
pub struct Timings {
    /// 打开页面后等待内容标记的时间
    pub marker_wait: Duration,
    /// 刷新后等待内容标记的时间
    pub refresh_wait: Duration,
    /// 等待菜单和编辑表单的时间
    pub edit_wait: Duration,
    /// 从队列取任务的超时
    pub pop_timeout: Duration,
    /// 打开编辑表单失败后的退避
    pub retry_backoff: Duration,
    pub scroll_throttle: Duration,
    pub edit_throttle: Duration,
    pub tab_switch: Duration,
    /// 点击保存后等待表单关闭的时间
    pub save_wait: Duration,
    /// 依次启动会话之间的间隔
    pub worker_stagger: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            marker_wait: Duration::from_secs(5),
            refresh_wait: Duration::from_secs(10),
            edit_wait: Duration::from_secs(5),
            pop_timeout: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(1),
            scroll_throttle: Duration::from_millis(300),
            edit_throttle: Duration::from_millis(200),
            tab_switch: Duration::from_millis(500),
            save_wait: Duration::from_millis(1500),
            worker_stagger: Duration::from_secs(1),
        }
    }
}

impl Timings {
    /// 全部为零，模拟会话和测试使用
    pub fn immediate() -> Self {
        Self {
            marker_wait: Duration::ZERO,
            refresh_wait: Duration::ZERO,
            edit_wait: Duration::ZERO,
            pop_timeout: Duration::ZERO,
            retry_backoff: Duration::ZERO,
            scroll_throttle: Duration::ZERO,
            edit_throttle: Duration::ZERO,
            tab_switch: Duration::ZERO,
            save_wait: Duration::ZERO,
            worker_stagger: Duration::ZERO,
        }
    }
}
