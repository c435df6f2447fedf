use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

use crate::error::ConfigError;

/// 分类规则
///
/// 标题 / 分类关键字都是不区分大小写的子串匹配，为空表示不限制。
/// 两者同时为空的规则不匹配任何条目。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, alias = "title")]
    pub title_keyword: String,
    #[serde(default, alias = "cat", alias = "category")]
    pub category_keyword: String,
    #[serde(alias = "target")]
    pub target_channel: String,
    #[serde(default, alias = "tags")]
    pub target_tags: Vec<String>,
}

impl Rule {
    pub fn new(
        title_keyword: impl Into<String>,
        category_keyword: impl Into<String>,
        target_channel: impl Into<String>,
    ) -> Self {
        Self {
            title_keyword: title_keyword.into(),
            category_keyword: category_keyword.into(),
            target_channel: target_channel.into(),
            target_tags: Vec::new(),
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.target_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// 去掉关键字两端空白，并检查目标频道
    pub fn normalized(self, index: usize) -> Result<Self, ConfigError> {
        let target_channel = self.target_channel.trim().to_string();
        if target_channel.is_empty() {
            return Err(ConfigError::InvalidRule {
                index,
                reason: "目标频道不能为空".to_string(),
            });
        }

        Ok(Self {
            title_keyword: self.title_keyword.trim().to_string(),
            category_keyword: self.category_keyword.trim().to_string(),
            target_channel,
            target_tags: self
                .target_tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        })
    }

    /// 两个关键字都为空
    pub fn has_no_filter(&self) -> bool {
        self.title_keyword.is_empty() && self.category_keyword.is_empty()
    }
}

/// 一次运行中使用的规则快照
///
/// 扫描阶段和编辑阶段共用同一份有序列表，运行期间不可修改。
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Arc<[Rule]>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules: rules.into(),
        }
    }
}

impl Deref for RuleSet {
    type Target = [Rule];

    fn deref(&self) -> &Self::Target {
        &self.rules
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}
