//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力：
//! 在页面上求值，或以某个元素为 `this` 调用函数。

use chromiumoxide::element::Element;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::InteractionResult;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() / call_on() 能力
/// - 不认识条目 / 规则
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于导航、查找元素等操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 在页面上执行 JS 表达式并反序列化结果
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> InteractionResult<T> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value::<JsonValue>()?;
        Ok(serde_json::from_value(json_value)?)
    }

    /// 以 `element` 为 `this` 调用 `function() { ... }`，没有返回值时得到 `Null`
    pub async fn call_on(
        &self,
        element: &Element,
        js_fn: impl Into<String>,
    ) -> InteractionResult<JsonValue> {
        let returns = element.call_js_fn(js_fn.into(), false).await?;
        Ok(returns.result.value.unwrap_or(JsonValue::Null))
    }

    /// 同 `call_on`，返回值不是字符串时得到空串
    pub async fn call_for_string(
        &self,
        element: &Element,
        js_fn: impl Into<String>,
    ) -> InteractionResult<String> {
        let value = self.call_on(element, js_fn).await?;
        Ok(value.as_str().map(str::to_string).unwrap_or_default())
    }
}

/// 把 Rust 字符串转成 JS 字面量，用于拼接到脚本中
pub fn js_literal(text: &str) -> InteractionResult<String> {
    Ok(serde_json::to_string(text)?)
}
