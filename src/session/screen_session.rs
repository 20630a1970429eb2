//! Screen session abstraction
//!
//! Everything above the transport (recovery, probe, enumeration driver)
//! talks to the host through this trait, so the TN3270 client can be swapped
//! for a scripted mock in tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::tn3270::Tn3270Error;

/// A stateful, block-mode terminal connection
#[async_trait]
pub trait ScreenSession: Send {
    /// Identifier used to tag log lines for this session
    fn session_id(&self) -> &str;

    /// Open the connection and wait for the first screen
    async fn initiate(&mut self, host: &str, port: u16) -> Result<(), Tn3270Error>;

    /// Type `text` at the cursor and press Enter
    async fn send_committed(&mut self, text: &str) -> Result<(), Tn3270Error>;

    /// Press function key PF`key`
    async fn send_function_key(&mut self, key: u8) -> Result<(), Tn3270Error>;

    /// Press Clear
    async fn send_clear(&mut self) -> Result<(), Tn3270Error>;

    /// Apply every screen update that arrives before `timeout` passes
    /// without new data. `None` uses the session's default drain timeout.
    async fn read_pending(&mut self, timeout: Option<Duration>) -> Result<(), Tn3270Error>;

    /// True when nothing visible is on the screen
    fn is_blank(&self) -> bool;

    /// Current screen as plain text
    fn raw_text(&self) -> String;

    fn contains_text(&self, needle: &str) -> bool {
        self.raw_text().contains(needle)
    }

    /// Drop the connection. Safe to call more than once.
    async fn close(&mut self);
}
