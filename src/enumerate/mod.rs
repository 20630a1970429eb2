//! Enumeration Module
//!
//! The reachability probe, the per-candidate driver, response
//! classification and screen captures.

pub mod capture;
pub mod classifier;
pub mod driver;
pub mod probe;

pub use capture::{capture_path, save_screen, CaptureError};
pub use classifier::{classify, ClassifyError, Outcome, OutcomeKind};
pub use driver::{AttemptError, Finding, TransactionDriver};
pub use probe::{probe, probe_target, ProbeOutcome, SIGNOFF_COMPLETE, SIGNOFF_TRANSACTION};
