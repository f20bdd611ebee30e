//! handcraft-retry: リトライライブラリ。
//!
//! 固定間隔または指数バックオフ付きの有限回リトライを提供する。

pub mod error;
pub mod policy;
pub mod retry;

pub use error::RetryError;
pub use policy::RetryConfig;
pub use retry::with_retry;
