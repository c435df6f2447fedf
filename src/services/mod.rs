pub mod log_sink;
pub mod page_scanner;
pub mod rule_engine;

pub use log_sink::LogSink;
pub use rule_engine::{is_candidate, match_item, match_rule};
