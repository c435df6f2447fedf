//! 条目处理上下文
//!
//! 封装"哪个 Worker 正在处理第几页的第几个条目"这一信息

use std::fmt::Display;

use crate::models::ContentItem;

/// 条目处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// Worker 编号（从 1 开始，仅用于日志）
    pub worker_id: usize,

    /// 页码
    pub page: u32,

    /// 扫描时读到的条目
    pub item: ContentItem,
}

impl ItemCtx {
    pub fn new(worker_id: usize, page: u32, item: ContentItem) -> Self {
        Self {
            worker_id,
            page,
            item,
        }
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[W{}] [第 {} 页 #{}]",
            self.worker_id,
            self.page,
            self.item.index + 1
        )
    }
}
