//! 基础设施层
//!
//! 持有一次运行内共享的可变状态（限流窗口、结果缓存）以及重试能力，
//! 不认识页面、句子之外的业务概念

pub mod cache;
pub mod rate_limiter;
pub mod retry;

pub use cache::{CacheKey, Lookup, ResultCache};
pub use rate_limiter::RateLimiter;
pub use retry::{with_retry, RetryObserver, RetryOptions};
