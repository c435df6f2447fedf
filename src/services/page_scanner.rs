//! 页面扫描 - 业务能力层
//!
//! 读取列表页上的条目，并用规则做一次只看标题的预筛选

use crate::config::Selectors;
use crate::error::InteractionResult;
use crate::infrastructure::Session;
use crate::models::{ContentItem, Rule};
use crate::services::rule_engine;

/// 读取当前页面的全部条目
pub async fn read_items<S: Session>(
    session: &S,
    selectors: &Selectors,
) -> InteractionResult<Vec<ContentItem>> {
    let titles = session
        .read_item_titles(&selectors.content_marker, &selectors.item_title)
        .await?;

    Ok(titles
        .into_iter()
        .enumerate()
        .map(|(index, text)| ContentItem::new(index, text))
        .collect())
}

/// 预筛选出候选条目，保持页面顺序
pub fn candidates(items: Vec<ContentItem>, rules: &[Rule]) -> Vec<ContentItem> {
    items
        .into_iter()
        .filter(|item| rule_engine::is_candidate(item, rules))
        .collect()
}
