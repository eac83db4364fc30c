//! Typed kernel snapshots and the refresh report.
//!
//! Each snapshot is a point-in-time, externally-sourced readout of one
//! category of process state.  All types are owned and serializable -- no
//! OS handles are held.  A refresh returns a [`SnapshotRefreshReport`]
//! rather than an error, so callers can distinguish "fully fresh",
//! "partially fresh", and "stale" instead of guessing from an exception.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Snapshot value types
// ---------------------------------------------------------------------------

/// Process memory counters.
#[derive(Debug, Clone, Serialize)]
pub struct MemorySnapshot {
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
}

/// Kernel object handle count.
#[derive(Debug, Clone, Serialize)]
pub struct HandleSnapshot {
    pub handle_count: u32,
}

/// CPU and I/O counters.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSnapshot {
    pub cpu_usage_percent: f32,
    pub run_time_secs: u64,
    pub disk_read_bytes: u64,
    pub disk_written_bytes: u64,
}

/// One thread of the process.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadInfo {
    pub tid: u32,
    pub base_priority: i32,
}

/// Thread inventory.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadSnapshot {
    pub thread_count: usize,
    pub threads: Vec<ThreadInfo>,
}

/// Security context of the process.  Fields the provider cannot answer
/// are `None`.
#[derive(Debug, Clone, Serialize)]
pub struct SecuritySnapshot {
    pub session_id: Option<u32>,
    pub user_id: Option<String>,
    pub elevated: Option<bool>,
}

/// One loaded module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub base_address: usize,
    pub size: u32,
}

/// Loaded-module inventory.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleSnapshot {
    pub modules: Vec<ModuleInfo>,
}

/// The executable's machine registration footprint.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    /// `App Paths` registration for the executable, if present.
    pub app_paths_entry: Option<String>,
    /// Autostart (`Run` key) entry matching the executable, if present.
    pub run_key_entry: Option<String>,
}

/// Filesystem-facing state of the process.
#[derive(Debug, Clone, Serialize)]
pub struct FilesystemSnapshot {
    pub current_working_dir: Option<PathBuf>,
    pub executable_size_bytes: Option<u64>,
    /// Open file handle count; `None` where the provider cannot answer.
    pub open_file_count: Option<u32>,
}

/// Aggregated window state for the process.
#[derive(Debug, Clone, Serialize)]
pub struct WindowStateSnapshot {
    pub window_count: usize,
    pub visible_count: usize,
    pub minimized_count: usize,
    /// Whether one of the process's windows is the foreground window.
    pub has_foreground: bool,
}

// ---------------------------------------------------------------------------
// Aggregate holder
// ---------------------------------------------------------------------------

/// Most recent snapshot of each category, each independently absent until
/// its provider first succeeds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KernelSnapshots {
    pub memory: Option<MemorySnapshot>,
    pub handles: Option<HandleSnapshot>,
    pub performance: Option<PerformanceSnapshot>,
    pub threads: Option<ThreadSnapshot>,
    pub security: Option<SecuritySnapshot>,
    pub modules: Option<ModuleSnapshot>,
    pub registry: Option<RegistrySnapshot>,
    pub filesystem: Option<FilesystemSnapshot>,
    pub window_state: Option<WindowStateSnapshot>,
    pub last_refreshed: Option<SystemTime>,
}

// ---------------------------------------------------------------------------
// Refresh report
// ---------------------------------------------------------------------------

/// The nine snapshot providers, in refresh order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Memory,
    Handles,
    Performance,
    Threads,
    Security,
    Modules,
    Registry,
    Filesystem,
    WindowState,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 9] = [
        ProviderKind::Memory,
        ProviderKind::Handles,
        ProviderKind::Performance,
        ProviderKind::Threads,
        ProviderKind::Security,
        ProviderKind::Modules,
        ProviderKind::Registry,
        ProviderKind::Filesystem,
        ProviderKind::WindowState,
    ];
}

/// Outcome of one provider call during a refresh.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderOutcome {
    pub kind: ProviderKind,
    pub ok: bool,
    /// Failure detail; empty for successes.
    pub detail: Option<String>,
}

/// Overall freshness after a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Every provider succeeded.
    Fresh,
    /// Some providers succeeded; the rest retain earlier data or none.
    Partial,
    /// No provider succeeded, or the refresh was skipped.
    Stale,
}

/// Per-provider result of one `refresh_kernel_snapshots` call.
///
/// Providers queried before a failure keep their stored data; the report
/// names exactly which categories are behind.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotRefreshReport {
    pub outcomes: Vec<ProviderOutcome>,
    /// True when the refresh was rejected (terminated context).
    pub skipped: bool,
}

impl SnapshotRefreshReport {
    pub(crate) fn skipped() -> Self {
        Self {
            outcomes: Vec::new(),
            skipped: true,
        }
    }

    pub(crate) fn record(&mut self, kind: ProviderKind, result: Result<(), String>) {
        match result {
            Ok(()) => self.outcomes.push(ProviderOutcome {
                kind,
                ok: true,
                detail: None,
            }),
            Err(detail) => self.outcomes.push(ProviderOutcome {
                kind,
                ok: false,
                detail: Some(detail),
            }),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.ok).count()
    }

    pub fn freshness(&self) -> Freshness {
        if self.skipped || self.succeeded() == 0 {
            Freshness::Stale
        } else if self.failed() == 0 {
            Freshness::Fresh
        } else {
            Freshness::Partial
        }
    }
}

impl Default for SnapshotRefreshReport {
    fn default() -> Self {
        Self {
            outcomes: Vec::with_capacity(ProviderKind::ALL.len()),
            skipped: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
