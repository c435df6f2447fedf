pub mod logging;

pub use logging::{first_line, truncate_text};
