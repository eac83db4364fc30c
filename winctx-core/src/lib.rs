//! `winctx_core` -- managed application contexts for Windows automation.
//!
//! Turns a raw process identifier into a stable, queryable handle onto
//! one application: its window set, a deterministically selected primary
//! window, and a refreshable set of kernel snapshots.  A name-keyed
//! [`registry::ProcessManager`] mediates launch, lookup, and
//! termination so no two contexts compete for the same process.
//!
//! All OS access goes through the trait seams in [`providers`]; the
//! Win32 + sysinfo implementations live in [`native`] and are only
//! compiled on Windows, which keeps the selection and lifecycle logic
//! testable anywhere.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`errors`] | `WinCtxError` enum via `thiserror` |
//! | [`window`] | `WindowDescriptor` and friends -- immutable window snapshots |
//! | [`classify`] | window-class patterns and priority classification |
//! | [`discovery`] | per-process window discovery and primary selection |
//! | [`snapshot`] | typed kernel snapshots and the refresh report |
//! | [`providers`] | injected collaborator traits |
//! | [`context`] | `ManagedApplicationContext` aggregate |
//! | [`registry`] | `ProcessManager` name directory |
//! | [`native`] | Win32 + sysinfo collaborator implementations (Windows only) |

pub mod classify;
pub mod context;
pub mod discovery;
pub mod errors;
pub mod providers;
pub mod registry;
pub mod snapshot;
pub mod window;

#[cfg(windows)]
pub mod native;

#[cfg(test)]
mod testutil;

pub use context::ManagedApplicationContext;
pub use errors::WinCtxError;
pub use registry::{LaunchSpec, ProcessManager};
