/// 列表页上的一个条目
///
/// 列表页不提供稳定 ID，只能用在页面内的位置 `index` 作为句柄，
/// 每次刷新后都要按 `index` 重新定位。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    /// 在页面内的位置（从 0 开始）
    pub index: usize,
    /// 扫描时读到的标题文本，只用于预筛选
    pub display_text: String,
    /// 打开编辑表单后才能读到的属性
    pub attributes: Option<EditAttributes>,
}

impl ContentItem {
    pub fn new(index: usize, display_text: impl Into<String>) -> Self {
        Self {
            index,
            display_text: display_text.into(),
            attributes: None,
        }
    }
}

/// 编辑表单中读到的当前属性
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditAttributes {
    pub title: String,
    pub current_tags: Vec<String>,
    pub current_category: String,
    pub current_channel: String,
}

/// 把标签输入框的内容拆成列表
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// 标签列表写回输入框时的格式
pub fn format_tags(tags: &[String]) -> String {
    tags.join(", ")
}
