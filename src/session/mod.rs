//! Session Module
//!
//! The `ScreenSession` seam between the TN3270 transport and the probing
//! logic, plus the bounded recovery loops shared by the reachability probe
//! and the enumeration driver.

pub mod recovery;
mod screen_session;

// Scripted sessions (tests only)
#[cfg(test)]
pub mod mock;

pub use recovery::{
    recover_blank_screen, send_init_commands, wait_while_blank, RecoveryOutcome, WaitPolicy,
    EXIT_KEY,
};
pub use screen_session::ScreenSession;
