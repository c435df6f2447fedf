pub mod chromium;
pub mod launcher;

pub use chromium::ChromiumSession;
pub use launcher::ChromiumProvider;
