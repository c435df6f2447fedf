pub mod toml_loader;

pub use toml_loader::{load_auth_state, load_channel_cache, load_rules, save_channel_cache};
