//! 基础设施层
//!
//! 持有稀缺资源（浏览器页面），只暴露交互能力，不认识规则和条目。

pub mod js_executor;
pub mod session;

pub use js_executor::JsExecutor;
pub use session::{Session, SessionProvider};
