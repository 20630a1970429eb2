//! Scripted screen session for tests
//!
//! Screens are plain strings. Each `read_pending` call delivers the next
//! queued screen, if any; committed text can be wired to queue replies.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;

use super::screen_session::ScreenSession;
use crate::tn3270::Tn3270Error;

/// Everything the code under test did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Initiate(String, u16),
    Committed(String),
    FunctionKey(u8),
    Clear,
    Read(Option<Duration>),
    Close,
}

pub struct MockSession {
    id: String,
    screen: String,
    pending: VecDeque<String>,
    replies: Vec<(String, Vec<String>)>,
    default_reply: Option<Vec<String>>,
    clear_blanks: bool,
    fail_initiate: bool,
    fail_after_commands: Option<usize>,
    fail_once: bool,
    failure: fn() -> Tn3270Error,
    commands_sent: usize,
    actions: Vec<Action>,
}

impl MockSession {
    /// Blank screen; Clear blanks the screen
    pub fn new() -> Self {
        Self {
            id: "mock".to_string(),
            screen: String::new(),
            pending: VecDeque::new(),
            replies: Vec::new(),
            default_reply: None,
            clear_blanks: true,
            fail_initiate: false,
            fail_after_commands: None,
            fail_once: false,
            failure: || Tn3270Error::Disconnected,
            commands_sent: 0,
            actions: Vec::new(),
        }
    }

    pub fn with_screen(mut self, screen: &str) -> Self {
        self.screen = screen.to_string();
        self
    }

    /// Queue screens delivered by successive reads
    pub fn with_pending(mut self, screens: Vec<String>) -> Self {
        self.pending.extend(screens);
        self
    }

    /// When `text` is committed, queue `screens`
    pub fn reply(mut self, text: &str, screens: &[&str]) -> Self {
        self.replies.push((
            text.to_string(),
            screens.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Screens queued for committed text with no specific reply
    pub fn reply_default(mut self, screens: &[&str]) -> Self {
        self.default_reply = Some(screens.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Clear leaves the screen as it is
    pub fn stuck(mut self) -> Self {
        self.clear_blanks = false;
        self
    }

    pub fn failing_initiate(mut self) -> Self {
        self.fail_initiate = true;
        self
    }

    /// Drop the connection once `n` commands have been committed
    pub fn disconnect_after(mut self, n: usize) -> Self {
        self.fail_after_commands = Some(n);
        self
    }

    /// Like `disconnect_after`, but only the first time
    pub fn disconnect_once_after(mut self, n: usize) -> Self {
        self.fail_after_commands = Some(n);
        self.fail_once = true;
        self
    }

    /// Fail with a garbled data stream once `n` commands have been committed
    pub fn protocol_error_after(mut self, n: usize) -> Self {
        self.fail_after_commands = Some(n);
        self.failure = || Tn3270Error::ProtocolError("unknown 3270 command 0x00".to_string());
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn count(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.actions.iter().filter(|a| pred(a)).count()
    }

    pub fn committed(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Committed(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScreenSession for MockSession {
    fn session_id(&self) -> &str {
        &self.id
    }

    async fn initiate(&mut self, host: &str, port: u16) -> Result<(), Tn3270Error> {
        self.actions.push(Action::Initiate(host.to_string(), port));
        if self.fail_initiate {
            return Err(Tn3270Error::ConnectionFailed("connection refused".to_string()));
        }
        Ok(())
    }

    async fn send_committed(&mut self, text: &str) -> Result<(), Tn3270Error> {
        if let Some(limit) = self.fail_after_commands {
            if self.commands_sent >= limit {
                if self.fail_once {
                    self.fail_after_commands = None;
                }
                return Err((self.failure)());
            }
        }
        self.commands_sent += 1;
        self.actions.push(Action::Committed(text.to_string()));

        let reply = self
            .replies
            .iter()
            .find(|(trigger, _)| trigger == text)
            .map(|(_, screens)| screens.clone())
            .or_else(|| self.default_reply.clone());
        if let Some(screens) = reply {
            self.pending.extend(screens);
        }
        Ok(())
    }

    async fn send_function_key(&mut self, key: u8) -> Result<(), Tn3270Error> {
        self.actions.push(Action::FunctionKey(key));
        Ok(())
    }

    async fn send_clear(&mut self) -> Result<(), Tn3270Error> {
        self.actions.push(Action::Clear);
        if self.clear_blanks {
            self.screen.clear();
        }
        Ok(())
    }

    async fn read_pending(&mut self, timeout: Option<Duration>) -> Result<(), Tn3270Error> {
        self.actions.push(Action::Read(timeout));
        if let Some(screen) = self.pending.pop_front() {
            self.screen = screen;
        }
        Ok(())
    }

    fn is_blank(&self) -> bool {
        self.screen.trim().is_empty()
    }

    fn raw_text(&self) -> String {
        self.screen.clone()
    }

    async fn close(&mut self) {
        self.actions.push(Action::Close);
    }
}
