use thiserror::Error;

use crate::protocol::Kind;

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, BridgeError>;

/// Errors surfaced by the protocol adapter.
///
/// All of these are fail-fast: the in-flight serialize or deserialize call is
/// aborted and no document is produced. There is no partial-success mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// An event arrived with no matching open context, or a close event did
    /// not match the innermost open context's kind.
    #[error("invalid protocol state: {0}")]
    InvalidState(&'static str),

    /// Text/byte conversion failed while coercing binary data to text.
    #[error("text encoding failed: {0}")]
    Encoding(#[from] core::str::Utf8Error),

    /// A map key of a kind that cannot be represented as a document key.
    ///
    /// Documents are string-keyed; see
    /// [`BridgeOptions::stringify_map_keys`](crate::BridgeOptions) for the
    /// opt-in integer coercion.
    #[error("unsupported map key kind {kind:?}: document keys are strings")]
    UnsupportedKeyType {
        /// The protocol kind of the offending key.
        kind: Kind,
    },

    /// A stored value had the wrong kind for the read that was requested.
    #[error("expected {expected}, found {found:?}")]
    UnexpectedKind {
        /// What the caller asked for.
        expected: &'static str,
        /// The kind actually stored in the document.
        found: Kind,
    },

    /// A narrowing read found an integer outside the requested width.
    #[error("{expected} out of range: {value}")]
    OutOfRange {
        /// The width the caller asked for.
        expected: &'static str,
        /// The stored value.
        value: i64,
    },
}
