//! Response classification
//!
//! Maps the screen left after submitting a transaction ID to an outcome.
//! The rules are plain substring checks against CICS messages, evaluated
//! in order; the first match wins.

use serde::{Deserialize, Serialize};

/// CICS answer for an unknown transaction (DFHAC2001)
pub const NOT_RECOGNIZED: &str = "not recognized";

/// Markers for transactions that exist but need a signed-on user
pub const AUTH_MARKERS: [&str; 2] = ["Unauthorized", "DFHAC2002"];

/// Outcome category, without evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Invalid,
    ValidBlank,
    ValidRequiresAuth,
    ValidWithScreen,
}

impl OutcomeKind {
    /// Label shown next to a valid transaction ID
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeKind::Invalid => "[invalid]",
            OutcomeKind::ValidBlank => "[blank screen]",
            OutcomeKind::ValidRequiresAuth => "[requires auth]",
            OutcomeKind::ValidWithScreen => "[valid]",
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, OutcomeKind::Invalid)
    }
}

/// Classified response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Invalid,
    /// Accepted, but nothing was painted. Also what a region that silently
    /// times out on bad input looks like, so this can be a false positive.
    ValidBlank,
    ValidRequiresAuth,
    ValidWithScreen { screen: String },
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Invalid => OutcomeKind::Invalid,
            Outcome::ValidBlank => OutcomeKind::ValidBlank,
            Outcome::ValidRequiresAuth => OutcomeKind::ValidRequiresAuth,
            Outcome::ValidWithScreen { .. } => OutcomeKind::ValidWithScreen,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("response did not match any known pattern")]
    Unclassified,
}

/// What the classifier gets to look at
#[derive(Debug, Clone, Copy)]
pub struct ScreenView<'a> {
    pub text: &'a str,
    pub blank: bool,
}

struct Rule {
    kind: OutcomeKind,
    matches: fn(&ScreenView<'_>) -> bool,
}

const RULES: [Rule; 4] = [
    Rule {
        kind: OutcomeKind::Invalid,
        matches: |view| view.text.contains(NOT_RECOGNIZED),
    },
    Rule {
        kind: OutcomeKind::ValidBlank,
        matches: |view| view.blank,
    },
    Rule {
        kind: OutcomeKind::ValidRequiresAuth,
        matches: |view| AUTH_MARKERS.iter().any(|m| view.text.contains(m)),
    },
    Rule {
        kind: OutcomeKind::ValidWithScreen,
        matches: |view| !view.blank,
    },
];

/// First rule matching the screen
pub fn classify_kind(view: &ScreenView<'_>) -> Result<OutcomeKind, ClassifyError> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(view))
        .map(|rule| rule.kind)
        .ok_or(ClassifyError::Unclassified)
}

/// Classify a screen, keeping the text when it is the evidence
pub fn classify(text: &str, blank: bool) -> Result<Outcome, ClassifyError> {
    let view = ScreenView { text, blank };
    Ok(match classify_kind(&view)? {
        OutcomeKind::Invalid => Outcome::Invalid,
        OutcomeKind::ValidBlank => Outcome::ValidBlank,
        OutcomeKind::ValidRequiresAuth => Outcome::ValidRequiresAuth,
        OutcomeKind::ValidWithScreen => Outcome::ValidWithScreen {
            screen: text.to_string(),
        },
    })
}
