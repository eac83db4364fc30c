//! Error types for `winctx_core`.
//!
//! All failures are funnelled through [`WinCtxError`], which uses
//! `thiserror` for `Display` and `Error` derives.  Snapshot-provider
//! failures are deliberately NOT represented here: a refresh returns a
//! [`crate::snapshot::SnapshotRefreshReport`] describing per-provider
//! outcomes instead of surfacing an error.

use thiserror::Error;

/// Top-level error type for the `winctx_core` library.
///
/// Each variant corresponds to a distinct failure class:
/// construction-fatal, reported-to-caller, or operation-rejected.
#[derive(Debug, Error)]
pub enum WinCtxError {
    /// Caller supplied an empty application name or a non-positive PID.
    #[error("InvalidIdentity: {0}")]
    InvalidIdentity(String),

    /// No process intelligence could be gathered for the PID.  Fatal at
    /// construction -- the context is never created.
    #[error("ProcessIntelligenceUnavailable: no process intelligence for pid {pid}")]
    ProcessIntelligenceUnavailable { pid: u32 },

    /// The termination executor reported failure.  The context remains
    /// active; termination is never silently swallowed.
    #[error("TerminationFailed: pid {pid}: {detail}")]
    TerminationFailed { pid: u32, detail: String },

    /// A new OS process could not be started.
    #[error("LaunchFailed: {0}")]
    LaunchFailed(String),

    /// A live context is already registered under this logical name.
    #[error("NameAlreadyRegistered: {0}")]
    NameAlreadyRegistered(String),

    /// No context is registered under this logical name.
    #[error("UnknownApplication: {0}")]
    UnknownApplication(String),

    /// The window-enumeration provider failed outright.  Discovery
    /// downgrades this to a logged warning and continues degraded.
    #[error("WindowEnumeration: {0}")]
    WindowEnumeration(String),
}
