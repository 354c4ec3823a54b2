pub mod history;
pub mod retry;

pub use history::HistoryBuffer;
pub use retry::{is_http_retryable, retry_with_backoff, RetryConfig};
