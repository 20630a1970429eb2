//! TN3270 Error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Tn3270Error {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TN3270 protocol error: {0}")]
    ProtocolError(String),

    #[error("Session not connected")]
    NotConnected,

    #[error("Disconnected")]
    Disconnected,
}

impl Tn3270Error {
    /// Whether a fresh connection could plausibly get past this error
    pub fn is_transient(&self) -> bool {
        !matches!(self, Tn3270Error::ProtocolError(_))
    }
}

// Serialized as its message in JSON scan reports
impl serde::Serialize for Tn3270Error {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Tn3270Error::Disconnected.is_transient());
        assert!(Tn3270Error::Timeout("connect".into()).is_transient());
        assert!(!Tn3270Error::ProtocolError("bad order".into()).is_transient());
    }

    #[test]
    fn test_serialize_as_message() {
        let json = serde_json::to_string(&Tn3270Error::NotConnected).unwrap();
        assert_eq!(json, "\"Session not connected\"");
    }
}
