// ── Core error types ──
//
// Nothing in the reconciliation path is fatal. These errors surface
// malformed input and failed store operations to the immediate caller;
// the engine logs and counts them without touching in-memory state.

use thiserror::Error;

use crate::table::Operation;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid hardware address: {input:?}")]
    InvalidHardwareAddress { input: String },

    #[error("Invalid lease event on line {line}: {reason}")]
    InvalidEvent { line: usize, reason: String },

    // ── Store errors ─────────────────────────────────────────────────
    #[error("Lease table {operation} failed for {hwaddr}: {reason}")]
    Store {
        operation: Operation,
        hwaddr: String,
        reason: String,
    },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
