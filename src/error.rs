//! Crate-wide error type.
//!
//! Every failure a UI layer can surface is a `PosError`; the `String`
//! conversion exists so hosts that work with plain message strings (the
//! mobile webview bridge does) can pass errors through verbatim.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PosError {
    /// Transport or backend failure: network unreachable, timeout, or a
    /// non-2xx response. The message is already user-presentable.
    #[error("{0}")]
    Api(String),

    /// Authentication failure: rejected login, missing token, or a 401 that
    /// purged the stored session.
    #[error("{0}")]
    Auth(String),

    /// Local validation caught before any network call was attempted.
    #[error("{0}")]
    Validation(String),

    /// Payment-proof image could not be decoded or compressed.
    #[error("{0}")]
    Media(String),

    /// Spreadsheet catalog source unreachable or not parseable as CSV.
    #[error("{0}")]
    Sheet(String),

    /// Session file could not be read or written.
    #[error("{0}")]
    Storage(String),
}

impl From<PosError> for String {
    fn from(err: PosError) -> String {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_passes_through_unchanged() {
        let err = PosError::Api("Cannot reach the POS backend".to_string());
        let msg: String = err.into();
        assert_eq!(msg, "Cannot reach the POS backend");
    }
}
