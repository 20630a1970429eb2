//! Enumeration Engine
//!
//! Runs the transaction driver over a candidate list with a pool of
//! sessions, retrying transport failures and collecting a report.

pub mod pool;
pub mod report;
pub mod retry;

pub use pool::run_enumeration;
pub use report::{FailedAttempt, ScanReport};
pub use retry::{attempt_with_retry, calculate_backoff, RetryConfig};
