//! Screen recovery
//!
//! A 3270 host gives no "idle" signal other than a blank screen, so every
//! protocol step starts by forcing the session back to one: PF3 to leave
//! whatever transaction is running, then Clear. Both loops here are bounded
//! so a wedged session costs a fixed number of round trips.

use std::time::Duration;

use tracing::debug;

use super::screen_session::ScreenSession;
use crate::config::Tuning;
use crate::tn3270::Tn3270Error;

/// Function key that ends the current CICS transaction
pub const EXIT_KEY: u8 = 3;

/// Result of a recovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Screen is blank after `iterations` PF3/Clear rounds
    Blank { iterations: usize },
    /// Bound reached with something still on screen
    Exhausted { iterations: usize },
}

impl RecoveryOutcome {
    pub fn is_blank(&self) -> bool {
        matches!(self, RecoveryOutcome::Blank { .. })
    }

    pub fn iterations(&self) -> usize {
        match self {
            RecoveryOutcome::Blank { iterations } | RecoveryOutcome::Exhausted { iterations } => {
                *iterations
            }
        }
    }
}

/// Drive the session to a blank screen in at most `bound` PF3/Clear rounds
pub async fn recover_blank_screen<S>(
    session: &mut S,
    bound: usize,
) -> Result<RecoveryOutcome, Tn3270Error>
where
    S: ScreenSession + ?Sized,
{
    let mut iterations = 0;

    while !session.is_blank() {
        if iterations >= bound {
            debug!(
                "Session {}: screen still not blank after {} recovery rounds",
                session.session_id(),
                iterations
            );
            return Ok(RecoveryOutcome::Exhausted { iterations });
        }

        session.send_function_key(EXIT_KEY).await?;
        session.read_pending(None).await?;
        session.send_clear().await?;
        session.read_pending(None).await?;
        iterations += 1;
    }

    Ok(RecoveryOutcome::Blank { iterations })
}

/// Progressive timeouts for waiting on a screen that has not been painted yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub bound: usize,
    pub initial: Duration,
    pub step: Duration,
}

impl From<&Tuning> for WaitPolicy {
    fn from(tuning: &Tuning) -> Self {
        Self {
            bound: tuning.wait_bound,
            initial: Duration::from_millis(tuning.wait_initial_ms),
            step: Duration::from_millis(tuning.wait_step_ms),
        }
    }
}

impl WaitPolicy {
    /// Timeout used for the `n`th wait (0-based)
    pub fn timeout_for(&self, n: usize) -> Duration {
        self.initial + self.step * n as u32
    }
}

/// Re-read while the screen stays blank, lengthening the timeout each time.
/// Returns the number of reads made.
pub async fn wait_while_blank<S>(session: &mut S, policy: &WaitPolicy) -> Result<usize, Tn3270Error>
where
    S: ScreenSession + ?Sized,
{
    let mut waits = 0;
    while session.is_blank() && waits < policy.bound {
        let timeout = policy.timeout_for(waits);
        debug!(
            "Session {}: screen blank, reading with {:?} timeout",
            session.session_id(),
            timeout
        );
        session.read_pending(Some(timeout)).await?;
        waits += 1;
    }
    Ok(waits)
}

/// Send each init command and drain the host's response to it
pub async fn send_init_commands<S>(session: &mut S, commands: &[String]) -> Result<(), Tn3270Error>
where
    S: ScreenSession + ?Sized,
{
    for (i, command) in commands.iter().enumerate() {
        debug!(
            "Session {}: issuing command {} of {}: {}",
            session.session_id(),
            i + 1,
            commands.len(),
            command
        );
        session.send_committed(command).await?;
        session.read_pending(None).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::{Action, MockSession};

    #[tokio::test]
    async fn test_already_blank_needs_no_keys() {
        let mut session = MockSession::new();
        let outcome = recover_blank_screen(&mut session, 10).await.unwrap();

        assert_eq!(outcome, RecoveryOutcome::Blank { iterations: 0 });
        assert!(session.actions().is_empty());
    }

    #[tokio::test]
    async fn test_pf3_then_clear() {
        let mut session = MockSession::new().with_screen("CEMT INQUIRE TASK");
        let outcome = recover_blank_screen(&mut session, 10).await.unwrap();

        assert_eq!(outcome, RecoveryOutcome::Blank { iterations: 1 });
        assert_eq!(
            session.actions(),
            &[
                Action::FunctionKey(3),
                Action::Read(None),
                Action::Clear,
                Action::Read(None)
            ]
        );
    }

    #[tokio::test]
    async fn test_stuck_screen_exhausts_bound() {
        let mut session = MockSession::new().with_screen("DFHCE3547 busy").stuck();
        let outcome = recover_blank_screen(&mut session, 6).await.unwrap();

        assert_eq!(outcome, RecoveryOutcome::Exhausted { iterations: 6 });
        assert_eq!(session.count(|a| matches!(a, Action::FunctionKey(3))), 6);
    }

    /// Small deterministic generator for screen sequences
    fn lcg(seed: &mut u64) -> u64 {
        *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        *seed >> 33
    }

    #[tokio::test]
    async fn test_terminates_on_arbitrary_sequences() {
        for seed in 0..64u64 {
            let mut state = seed;
            let screens: Vec<String> = (0..40)
                .map(|_| {
                    if lcg(&mut state) % 3 == 0 {
                        String::new()
                    } else {
                        "SOMETHING ON SCREEN".to_string()
                    }
                })
                .collect();
            let bound = 1 + (lcg(&mut state) % 10) as usize;

            let mut session = MockSession::new()
                .with_screen("START")
                .stuck()
                .with_pending(screens);
            let outcome = recover_blank_screen(&mut session, bound).await.unwrap();

            assert!(outcome.iterations() <= bound);
            assert!(session.count(|a| matches!(a, Action::FunctionKey(_))) <= bound);
            assert_eq!(outcome.is_blank(), session.is_blank());
        }
    }

    #[tokio::test]
    async fn test_wait_grows_timeout() {
        let mut session = MockSession::new();
        let policy = WaitPolicy {
            bound: 7,
            initial: Duration::from_millis(300),
            step: Duration::from_millis(100),
        };
        let waits = wait_while_blank(&mut session, &policy).await.unwrap();

        assert_eq!(waits, 7);
        let timeouts: Vec<_> = session
            .actions()
            .iter()
            .filter_map(|a| match a {
                Action::Read(Some(t)) => Some(t.as_millis()),
                _ => None,
            })
            .collect();
        assert_eq!(timeouts, vec![300, 400, 500, 600, 700, 800, 900]);
    }

    #[tokio::test]
    async fn test_wait_stops_when_painted() {
        let mut session = MockSession::new().with_pending(vec![String::new(), "READY".into()]);
        let waits = wait_while_blank(&mut session, &WaitPolicy::from(&Tuning::default()))
            .await
            .unwrap();

        assert_eq!(waits, 2);
        assert!(session.contains_text("READY"));
    }

    #[tokio::test]
    async fn test_init_commands_in_order() {
        let mut session = MockSession::new();
        let commands = vec!["logon applid(cics)".to_string(), "cics".to_string()];
        send_init_commands(&mut session, &commands).await.unwrap();

        assert_eq!(
            session.actions(),
            &[
                Action::Committed("logon applid(cics)".into()),
                Action::Read(None),
                Action::Committed("cics".into()),
                Action::Read(None)
            ]
        );
    }
}
