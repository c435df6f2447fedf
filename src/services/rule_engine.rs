//! 规则匹配 - 业务能力层
//!
//! 纯函数，不做任何 I/O。扫描阶段（只有标题）和编辑阶段（标题 + 分类）
//! 走的是同一个函数、同一份有序规则列表。

use crate::models::{ContentItem, Rule};

/// 按顺序查找第一条匹配的规则
///
/// - 非空关键字必须是对应字段的子串（不区分大小写）
/// - `category` 为 `None` 表示分类还不可见（扫描阶段），此时分类关键字不参与判断
/// - 标题和分类关键字都为空的规则不匹配任何条目
pub fn match_rule<'a>(title: &str, category: Option<&str>, rules: &'a [Rule]) -> Option<&'a Rule> {
    let title = title.to_lowercase();
    let category = category.map(str::to_lowercase);

    rules.iter().find(|rule| {
        if rule.has_no_filter() {
            return false;
        }

        let title_ok = rule.title_keyword.is_empty()
            || title.contains(&rule.title_keyword.to_lowercase());

        let category_ok = rule.category_keyword.is_empty()
            || category
                .as_deref()
                .map_or(true, |c| c.contains(&rule.category_keyword.to_lowercase()));

        title_ok && category_ok
    })
}

/// 扫描阶段的预筛选：只看标题
pub fn is_candidate(item: &ContentItem, rules: &[Rule]) -> bool {
    match_rule(&item.display_text, None, rules).is_some()
}

/// 编辑阶段的完整匹配：标题 + 分类
pub fn match_item<'a>(item: &ContentItem, rules: &'a [Rule]) -> Option<&'a Rule> {
    match &item.attributes {
        Some(attrs) => match_rule(&attrs.title, Some(&attrs.current_category), rules),
        None => match_rule(&item.display_text, None, rules),
    }
}
