//! Error taxonomy shared by the codec, transport, and client layers.
//!
//! Every variant carries a complete, operator-readable message; `Display`
//! prints it verbatim so errors can be shown directly to a human or an AI
//! agent. The variant itself is the machine-readable kind. Nothing in this
//! crate retries on error; recovery is the caller's decision.

/// Errors produced while talking to a Pmon daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PmonError {
    /// Caller input rejected before any socket was opened (bad index range,
    /// empty manager name, unknown start mode).
    Validation(String),
    /// Socket-level failure during the round-trip (refused, reset, closed
    /// before any data).
    Connection(String),
    /// The response window elapsed with zero bytes received. A window that
    /// elapses after partial data is not an error (see the transport's
    /// salvage rule).
    Timeout(String),
    /// The response text did not match the expected reply grammar. The
    /// message includes the offending raw line.
    Protocol(String),
}

impl PmonError {
    /// Prefix the message with the failing operation, keeping the kind.
    ///
    /// Used by query operations so a propagated error always names what was
    /// being attempted, e.g. `"Failed to get manager status: ..."`.
    pub fn context(self, prefix: &str) -> Self {
        match self {
            PmonError::Validation(m) => PmonError::Validation(format!("{prefix}: {m}")),
            PmonError::Connection(m) => PmonError::Connection(format!("{prefix}: {m}")),
            PmonError::Timeout(m) => PmonError::Timeout(format!("{prefix}: {m}")),
            PmonError::Protocol(m) => PmonError::Protocol(format!("{prefix}: {m}")),
        }
    }

    /// Short lowercase tag for the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PmonError::Validation(_) => "validation",
            PmonError::Connection(_) => "connection",
            PmonError::Timeout(_) => "timeout",
            PmonError::Protocol(_) => "protocol",
        }
    }

    /// Returns `true` if the error was raised before any network I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, PmonError::Validation(_))
    }
}

impl std::fmt::Display for PmonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PmonError::Validation(m)
            | PmonError::Connection(m)
            | PmonError::Timeout(m)
            | PmonError::Protocol(m) => f.write_str(m),
        }
    }
}

impl std::error::Error for PmonError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_preserves_kind() {
        let err = PmonError::Timeout("no response within 5000 ms".to_string());
        let wrapped = err.context("Failed to get manager status");
        assert_eq!(wrapped.kind(), "timeout");
        assert_eq!(
            wrapped.to_string(),
            "Failed to get manager status: no response within 5000 ms"
        );
    }

    #[test]
    fn display_is_the_plain_message() {
        let err = PmonError::Validation("manager index must be at least 1".to_string());
        assert_eq!(err.to_string(), "manager index must be at least 1");
        assert!(err.is_validation());
    }
}
