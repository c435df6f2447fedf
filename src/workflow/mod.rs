pub mod action_executor;
pub mod channel_catalog;
pub mod item_ctx;

pub use action_executor::{ActionExecutor, ChangePlan, ItemOutcome, SkipReason};
pub use channel_catalog::fetch_channels;
pub use item_ctx::ItemCtx;
