//! 读取账号下可选的频道列表
//!
//! 打开第一页第一个条目的编辑表单，列出频道下拉框的全部选项，
//! 供编辑规则时选择目标频道。

use tracing::info;

use crate::config::{Selectors, SwarmSettings};
use crate::error::{InteractionError, InteractionResult};
use crate::infrastructure::Session;

pub async fn fetch_channels<S: Session>(
    session: &S,
    settings: &SwarmSettings,
) -> InteractionResult<Vec<String>> {
    let selectors = &settings.selectors;
    let timings = &settings.timings;

    info!("正在读取频道列表...");
    session.navigate(&settings.page_url(1)).await?;

    let trigger = session
        .wait_for(&selectors.item_trigger, timings.refresh_wait)
        .await?;
    session.click(&trigger).await?;

    let edit = session
        .wait_for(&selectors.edit_action, timings.edit_wait)
        .await?;
    session.click(&edit).await?;
    session
        .wait_for(&selectors.edit_form, timings.edit_wait)
        .await?;

    let tab = session
        .find_all(&selectors.secondary_tab)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| InteractionError::not_found(&selectors.secondary_tab))?;
    session.click(&tab).await?;
    tokio::time::sleep(timings.tab_switch).await;

    let mut channels = Vec::new();
    for option in session
        .find_all(&Selectors::options(&selectors.channel_select))
        .await?
    {
        let text = session.get_attribute(&option, "textContent").await?;
        let text = text.trim();
        if !text.is_empty() {
            channels.push(text.to_string());
        }
    }

    info!("✓ 读取到 {} 个频道", channels.len());
    Ok(channels)
}
