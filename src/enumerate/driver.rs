//! Transaction ID enumeration driver
//!
//! One driver owns one session and tries candidates on it one at a time.
//! Every attempt re-enters CICS with the init commands, forces a blank
//! screen, types the transaction ID and classifies what comes back.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use super::capture::save_screen;
use super::classifier::{classify, ClassifyError, Outcome, OutcomeKind};
use crate::config::{ScanConfig, Tuning};
use crate::session::{
    recover_blank_screen, send_init_commands, wait_while_blank, ScreenSession, WaitPolicy,
};
use crate::tn3270::Tn3270Error;

/// A transaction ID the region accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub identifier: String,
    pub kind: OutcomeKind,
    /// Saved screen, when one was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<PathBuf>,
}

impl Finding {
    /// e.g. `CEMT [requires auth]`
    pub fn label(&self) -> String {
        format!("{} {}", self.identifier, self.kind.label())
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())?;
        if let Some(path) = &self.evidence {
            write!(f, " ({})", path.display())?;
        }
        Ok(())
    }
}

/// Why an attempt produced no finding
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("Incorrect {0} identifier")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(#[from] Tn3270Error),

    #[error(transparent)]
    Unclassified(#[from] ClassifyError),
}

impl AttemptError {
    /// Worth reconnecting and trying the same candidate again
    pub fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Transport(e) => e.is_transient(),
            _ => false,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, AttemptError::Rejected(_))
    }
}

pub struct TransactionDriver<S> {
    session: S,
    host: String,
    port: u16,
    commands: Vec<String>,
    output_dir: Option<PathBuf>,
    tuning: Tuning,
    connected: bool,
}

impl<S: ScreenSession> TransactionDriver<S> {
    pub fn new(session: S, config: &ScanConfig) -> Self {
        Self {
            session,
            host: config.host.clone(),
            port: config.port,
            commands: config.init_commands(),
            output_dir: config.output_dir.clone(),
            tuning: config.tuning.clone(),
            connected: false,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub async fn connect(&mut self) -> Result<(), Tn3270Error> {
        if self.connected {
            return Ok(());
        }
        self.session.initiate(&self.host, self.port).await?;
        self.connected = true;
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        self.session.close().await;
        self.connected = false;
    }

    /// Try one transaction ID
    pub async fn attempt(&mut self, candidate: &str) -> Result<Finding, AttemptError> {
        let wait = WaitPolicy::from(&self.tuning);
        let session_id = self.session.session_id().to_string();

        send_init_commands(&mut self.session, &self.commands).await?;
        wait_while_blank(&mut self.session, &wait).await?;

        let recovery =
            recover_blank_screen(&mut self.session, self.tuning.attempt_recovery_bound).await?;
        if !recovery.is_blank() {
            debug!(
                "Session {}: no blank screen after {} rounds, submitting {} anyway",
                session_id,
                recovery.iterations(),
                candidate
            );
        }

        let identifier = candidate.to_uppercase();
        self.session.send_committed(&identifier).await?;
        self.session.read_pending(None).await?;
        wait_while_blank(&mut self.session, &wait).await?;

        let text = self.session.raw_text();
        let outcome = classify(&text, self.session.is_blank())?;
        debug!("Session {}: {} -> {:?}", session_id, identifier, outcome.kind());

        let kind = outcome.kind();
        let evidence = match outcome {
            Outcome::Invalid => return Err(AttemptError::Rejected(identifier)),
            Outcome::ValidWithScreen { screen } => {
                capture(self.output_dir.as_deref(), &identifier, &screen).await
            }
            Outcome::ValidBlank | Outcome::ValidRequiresAuth => None,
        };

        Ok(Finding {
            identifier,
            kind,
            evidence,
        })
    }
}

/// Best effort: a failed write is logged and the finding kept
async fn capture(dir: Option<&Path>, identifier: &str, screen: &str) -> Option<PathBuf> {
    let dir = dir?;
    match save_screen(dir, identifier, screen).await {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Failed to save screen for {}: {}", identifier, e);
            None
        }
    }
}
