//! Collaborator interfaces consumed by the context and the manager.
//!
//! Every OS-facing dependency is an explicitly injected trait object,
//! bundled in [`Collaborators`] and passed at construction.  Tests
//! substitute fakes; production code uses the `native` implementations.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::errors::WinCtxError;
use crate::snapshot::{
    FilesystemSnapshot, HandleSnapshot, MemorySnapshot, ModuleSnapshot, PerformanceSnapshot,
    RegistrySnapshot, SecuritySnapshot, ThreadSnapshot, WindowStateSnapshot,
};
use crate::window::{DesktopWindow, WindowDescriptor};

// ---------------------------------------------------------------------------
// Process introspection
// ---------------------------------------------------------------------------

/// Intelligence gathered about a process at attach time.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessIntelligence {
    pub executable_path: Option<PathBuf>,
    pub command_line: Vec<String>,
    pub parent_pid: Option<u32>,
    /// Process start time, seconds since the Unix epoch.  Guards against
    /// PID reuse when re-checking liveness.
    pub start_time_secs: u64,
}

impl ProcessIntelligence {
    /// Lower-cased executable file name, e.g. `"explorer.exe"`.
    pub fn executable_name(&self) -> Option<String> {
        self.executable_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_lowercase())
    }
}

/// Queries about live processes.
pub trait ProcessIntrospector: Send + Sync {
    /// Gather executable path, command line, and parent PID.  `None` when
    /// the process cannot be inspected -- fatal at context construction.
    fn gather_intelligence(&self, pid: u32) -> Option<ProcessIntelligence>;

    /// Liveness query.
    fn is_running(&self, pid: u32) -> bool;

    /// Find a running process whose executable name matches the given
    /// lower-case stem (name-to-executable convention, e.g. `"notepad"`
    /// matches `notepad.exe`).
    fn find_pid_by_name(&self, stem: &str) -> Option<u32>;
}

// ---------------------------------------------------------------------------
// Window enumeration
// ---------------------------------------------------------------------------

/// Top-level window discovery for one PID plus the desktop-wide lister
/// used by the cross-process searches.
pub trait WindowSource: Send + Sync {
    /// All top-level window handles currently owned by the PID, in
    /// z-order.
    fn process_windows(&self, pid: u32) -> Result<Vec<isize>, WinCtxError>;

    /// Whether the handle still refers to a real window.
    fn is_valid_window(&self, handle: isize) -> bool;

    /// Read one window's properties.  `None` when the window vanished or
    /// its properties cannot be read.
    fn probe_window(&self, handle: isize) -> Option<WindowDescriptor>;

    /// Every top-level window on the desktop, all processes.
    fn list_all_windows(&self) -> Vec<DesktopWindow>;
}

// ---------------------------------------------------------------------------
// Kernel snapshot providers
// ---------------------------------------------------------------------------

/// The nine per-resource snapshot providers.
///
/// Each method is one independent provider: `get_snapshot(pid)` returning
/// a typed value or a failure detail.  The aggregator stores whichever
/// succeed and reports the rest.
pub trait SnapshotSuite: Send + Sync {
    fn memory(&self, pid: u32) -> Result<MemorySnapshot, String>;
    fn handles(&self, pid: u32) -> Result<HandleSnapshot, String>;
    fn performance(&self, pid: u32) -> Result<PerformanceSnapshot, String>;
    fn threads(&self, pid: u32) -> Result<ThreadSnapshot, String>;
    fn security(&self, pid: u32) -> Result<SecuritySnapshot, String>;
    fn modules(&self, pid: u32) -> Result<ModuleSnapshot, String>;
    fn registry(&self, pid: u32) -> Result<RegistrySnapshot, String>;
    fn filesystem(&self, pid: u32) -> Result<FilesystemSnapshot, String>;
    fn window_state(&self, pid: u32) -> Result<WindowStateSnapshot, String>;
}

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

/// How hard to push a process toward exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStrategy {
    /// Ask nicely, escalate to a forced kill if the process lingers.
    GracefulThenForced,
    /// Ask nicely and give up on refusal.
    GracefulOnly,
    /// Kill without asking.
    Forced,
    /// Close the process's windows and let it decide.
    WindowClose,
}

/// Classification of a termination attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationOutcome {
    /// The process exited in response to a graceful request.
    Graceful,
    /// The process was forcibly killed.
    Forced,
    /// The process exited after its windows were closed.
    WindowClosed,
    /// The context was already terminated; nothing was done.
    AlreadyTerminated,
    /// The process survived every step of the strategy.
    Failed(String),
}

impl TerminationOutcome {
    /// Any classification other than [`TerminationOutcome::Failed`]
    /// transitions the context to terminated.
    pub fn is_success(&self) -> bool {
        !matches!(self, TerminationOutcome::Failed(_))
    }
}

/// Executes a termination strategy against a PID.
pub trait TerminationExecutor: Send + Sync {
    fn terminate(&self, pid: u32, strategy: TerminationStrategy) -> TerminationOutcome;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// The full set of collaborators a context needs.
///
/// Cheap to clone; trait objects are shared.
#[derive(Clone)]
pub struct Collaborators {
    pub introspector: Arc<dyn ProcessIntrospector>,
    pub windows: Arc<dyn WindowSource>,
    pub snapshots: Arc<dyn SnapshotSuite>,
    pub terminator: Arc<dyn TerminationExecutor>,
}

#[cfg(windows)]
impl Collaborators {
    /// Production wiring: Win32 + sysinfo implementations.
    pub fn native() -> Self {
        let windows = Arc::new(crate::native::Win32WindowSource::new());
        Self {
            introspector: Arc::new(crate::native::SysinfoIntrospector::new()),
            snapshots: Arc::new(crate::native::NativeSnapshotSuite::new(windows.clone())),
            terminator: Arc::new(crate::native::Win32Terminator::new()),
            windows,
        }
    }
}
