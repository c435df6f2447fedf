pub mod content_item;
pub mod loaders;
pub mod rule;

pub use content_item::{ContentItem, EditAttributes};
pub use loaders::{load_auth_state, load_channel_cache, load_rules, save_channel_cache};
pub use rule::{Rule, RuleSet};
