//! Reachability probe
//!
//! Before enumerating, check that the init commands really land in a CICS
//! region: clear down to a blank screen, then sign off with CESF and look
//! for the sign-off confirmation. Only a CICS region answers that way.

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::Tuning;
use crate::session::{recover_blank_screen, send_init_commands, ScreenSession};
use crate::tn3270::Tn3270Error;

/// Sign-off transaction sent once the screen is blank
pub const SIGNOFF_TRANSACTION: &str = "CESF LOGOFF";

/// Text CICS paints after a successful CESF
pub const SIGNOFF_COMPLETE: &str = "Sign-off is complete.";

/// Why a target was or was not considered reachable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    ConnectFailed(String),
    /// Recovery never reached a blank screen
    NoBlankScreen { iterations: usize },
    /// CESF was sent but the confirmation never appeared
    NoSignoff,
    /// Connection lost after it was established
    Transport(String),
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Reachable => write!(f, "CICS region reachable"),
            ProbeOutcome::ConnectFailed(e) => write!(f, "could not connect: {}", e),
            ProbeOutcome::NoBlankScreen { iterations } => write!(
                f,
                "could not get a blank screen after {} PF3/Clear rounds; check the init commands",
                iterations
            ),
            ProbeOutcome::NoSignoff => write!(
                f,
                "'{}' was not confirmed; the init commands do not seem to reach CICS",
                SIGNOFF_TRANSACTION
            ),
            ProbeOutcome::Transport(e) => write!(f, "connection lost during probe: {}", e),
        }
    }
}

/// Probe `host:port` with a fresh session. The session is always closed
/// before returning.
pub async fn probe_target<S>(
    session: &mut S,
    host: &str,
    port: u16,
    commands: &[String],
    tuning: &Tuning,
) -> ProbeOutcome
where
    S: ScreenSession + ?Sized,
{
    info!("Probing {}:{} for CICS", host, port);

    if let Err(e) = session.initiate(host, port).await {
        warn!("Probe of {}:{} failed to connect: {}", host, port, e);
        session.close().await;
        return ProbeOutcome::ConnectFailed(e.to_string());
    }

    let outcome = match run_probe(session, commands, tuning).await {
        Ok(outcome) => outcome,
        Err(e) => ProbeOutcome::Transport(e.to_string()),
    };
    session.close().await;

    info!("Probe of {}:{}: {}", host, port, outcome);
    outcome
}

async fn run_probe<S>(
    session: &mut S,
    commands: &[String],
    tuning: &Tuning,
) -> Result<ProbeOutcome, Tn3270Error>
where
    S: ScreenSession + ?Sized,
{
    send_init_commands(session, commands).await?;

    let recovery = recover_blank_screen(session, tuning.probe_recovery_bound).await?;
    if !recovery.is_blank() {
        return Ok(ProbeOutcome::NoBlankScreen {
            iterations: recovery.iterations(),
        });
    }

    session.send_committed(SIGNOFF_TRANSACTION).await?;
    session.read_pending(None).await?;
    if session.is_blank() {
        debug!(
            "Session {}: sign-off screen not painted yet, waiting {:?}",
            session.session_id(),
            tuning.signoff_wait()
        );
        session.read_pending(Some(tuning.signoff_wait())).await?;
    }

    if session.contains_text(SIGNOFF_COMPLETE) {
        Ok(ProbeOutcome::Reachable)
    } else {
        debug!(
            "Session {}: screen after sign-off:\n{}",
            session.session_id(),
            session.raw_text()
        );
        Ok(ProbeOutcome::NoSignoff)
    }
}

/// `probe_target` reduced to reachable or not
pub async fn probe<S>(
    session: &mut S,
    host: &str,
    port: u16,
    commands: &[String],
    tuning: &Tuning,
) -> bool
where
    S: ScreenSession + ?Sized,
{
    probe_target(session, host, port, commands, tuning)
        .await
        .is_reachable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::{Action, MockSession};

    fn menu() -> Vec<String> {
        vec!["menu".to_string()]
    }

    #[tokio::test]
    async fn test_reachable() {
        let mut session = MockSession::new()
            .reply("menu", &["CICS TS FOR Z/OS"])
            .reply(SIGNOFF_TRANSACTION, &["DFHCE3549 Sign-off is complete."]);

        let reachable = probe(&mut session, "mainframe", 23, &menu(), &Tuning::default()).await;

        assert!(reachable);
        assert_eq!(session.committed(), vec!["menu", SIGNOFF_TRANSACTION]);
        assert_eq!(session.actions().last(), Some(&Action::Close));
    }

    #[tokio::test]
    async fn test_late_signoff_confirmation() {
        let tuning = Tuning::default();
        let mut session = MockSession::new()
            .reply("menu", &["CICS TS FOR Z/OS"])
            .reply(SIGNOFF_TRANSACTION, &["", "DFHCE3549 Sign-off is complete."]);

        let outcome = probe_target(&mut session, "mainframe", 23, &menu(), &tuning).await;

        assert_eq!(outcome, ProbeOutcome::Reachable);
        assert!(session
            .actions()
            .contains(&Action::Read(Some(tuning.signoff_wait()))));
    }

    #[tokio::test]
    async fn test_stuck_screen_is_unreachable() {
        let mut session = MockSession::new()
            .with_screen("DFHCE3547 PLEASE WAIT")
            .stuck();

        let outcome = probe_target(&mut session, "mainframe", 23, &menu(), &Tuning::default()).await;

        assert_eq!(outcome, ProbeOutcome::NoBlankScreen { iterations: 6 });
        assert!(!session.committed().contains(&SIGNOFF_TRANSACTION));
        assert_eq!(session.count(|a| matches!(a, Action::FunctionKey(3))), 6);
        assert_eq!(session.actions().last(), Some(&Action::Close));
    }

    #[tokio::test]
    async fn test_missing_marker() {
        let mut session = MockSession::new().reply(SIGNOFF_TRANSACTION, &["READY"]);

        let outcome = probe_target(&mut session, "mainframe", 23, &menu(), &Tuning::default()).await;

        assert_eq!(outcome, ProbeOutcome::NoSignoff);
        assert!(!outcome.is_reachable());
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let mut session = MockSession::new().failing_initiate();

        let outcome = probe_target(&mut session, "mainframe", 23, &menu(), &Tuning::default()).await;

        assert!(matches!(outcome, ProbeOutcome::ConnectFailed(_)));
        assert!(session.committed().is_empty());
        assert_eq!(session.actions().last(), Some(&Action::Close));
    }

    #[tokio::test]
    async fn test_disconnect_mid_probe() {
        let mut session = MockSession::new().disconnect_after(0);

        let outcome = probe_target(&mut session, "mainframe", 23, &menu(), &Tuning::default()).await;

        assert!(matches!(outcome, ProbeOutcome::Transport(_)));
        assert_eq!(session.actions().last(), Some(&Action::Close));
    }
}
