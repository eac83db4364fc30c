//! Fake collaborators shared by the context, discovery, and registry
//! test modules.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::WinCtxError;
use crate::providers::{
    Collaborators, ProcessIntelligence, ProcessIntrospector, SnapshotSuite, TerminationExecutor,
    TerminationOutcome, TerminationStrategy, WindowSource,
};
use crate::snapshot::{
    FilesystemSnapshot, HandleSnapshot, MemorySnapshot, ModuleSnapshot, PerformanceSnapshot,
    ProviderKind, RegistrySnapshot, SecuritySnapshot, ThreadSnapshot, WindowStateSnapshot,
};
use crate::window::{DesktopWindow, WindowBounds, WindowDescriptor};

/// Build a descriptor with the fields tests care about; the rest default
/// to an enabled, unminimized window.
pub fn desc(
    handle: isize,
    class: &str,
    title: &str,
    visible: bool,
    bounds: WindowBounds,
) -> WindowDescriptor {
    WindowDescriptor {
        handle,
        title: title.into(),
        class_name: class.into(),
        bounds,
        visible,
        enabled: true,
        minimized: false,
        maximized: false,
        z_order: None,
    }
}

/// Canned collaborators knowing exactly one process.
pub fn test_collab(pid: u32, exe: &str, windows: FakeWindowSource) -> Collaborators {
    Collaborators {
        introspector: Arc::new(FakeIntrospector::single(pid, exe)),
        windows: Arc::new(windows),
        snapshots: Arc::new(FakeSnapshotSuite::default()),
        terminator: Arc::new(FakeTerminator::graceful()),
    }
}

// ---------------------------------------------------------------------------
// Introspector
// ---------------------------------------------------------------------------

pub struct FakeIntrospector {
    intel: HashMap<u32, ProcessIntelligence>,
}

impl FakeIntrospector {
    pub fn single(pid: u32, exe: &str) -> Self {
        let mut intel = HashMap::new();
        intel.insert(
            pid,
            ProcessIntelligence {
                executable_path: Some(PathBuf::from(format!("C:\\apps\\{exe}"))),
                command_line: vec![exe.to_string()],
                parent_pid: Some(4),
                start_time_secs: 1_700_000_000,
            },
        );
        Self { intel }
    }
}

impl ProcessIntrospector for FakeIntrospector {
    fn gather_intelligence(&self, pid: u32) -> Option<ProcessIntelligence> {
        self.intel.get(&pid).cloned()
    }

    fn is_running(&self, pid: u32) -> bool {
        self.intel.contains_key(&pid)
    }

    fn find_pid_by_name(&self, stem: &str) -> Option<u32> {
        self.intel.iter().find_map(|(pid, intel)| {
            let exe = intel.executable_name()?;
            let exe_stem = exe.strip_suffix(".exe").unwrap_or(&exe);
            (exe_stem == stem).then_some(*pid)
        })
    }
}

// ---------------------------------------------------------------------------
// Window source
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeWindowSource {
    pub per_pid: HashMap<u32, Vec<WindowDescriptor>>,
    pub desktop: Vec<DesktopWindow>,
}

impl FakeWindowSource {
    pub fn with_windows(pid: u32, windows: Vec<WindowDescriptor>) -> Self {
        let mut per_pid = HashMap::new();
        per_pid.insert(pid, windows);
        Self {
            per_pid,
            desktop: Vec::new(),
        }
    }

    fn find(&self, handle: isize) -> Option<&WindowDescriptor> {
        self.per_pid
            .values()
            .flatten()
            .find(|w| w.handle == handle)
            .or_else(|| {
                self.desktop
                    .iter()
                    .map(|w| &w.descriptor)
                    .find(|w| w.handle == handle)
            })
    }
}

impl WindowSource for FakeWindowSource {
    fn process_windows(&self, pid: u32) -> Result<Vec<isize>, WinCtxError> {
        Ok(self
            .per_pid
            .get(&pid)
            .map(|ws| ws.iter().map(|w| w.handle).collect())
            .unwrap_or_default())
    }

    fn is_valid_window(&self, handle: isize) -> bool {
        self.find(handle).is_some()
    }

    fn probe_window(&self, handle: isize) -> Option<WindowDescriptor> {
        self.find(handle).cloned()
    }

    fn list_all_windows(&self) -> Vec<DesktopWindow> {
        self.desktop.clone()
    }
}

// ---------------------------------------------------------------------------
// Snapshot suite
// ---------------------------------------------------------------------------

/// Returns canned snapshots, with a configurable set of failing
/// providers.
#[derive(Default)]
pub struct FakeSnapshotSuite {
    failing: HashSet<ProviderKind>,
}

impl FakeSnapshotSuite {
    pub fn failing(kinds: &[ProviderKind]) -> Self {
        Self {
            failing: kinds.iter().copied().collect(),
        }
    }

    fn gate<T>(&self, kind: ProviderKind, value: T) -> Result<T, String> {
        if self.failing.contains(&kind) {
            Err(format!("{kind:?} provider offline"))
        } else {
            Ok(value)
        }
    }
}

impl SnapshotSuite for FakeSnapshotSuite {
    fn memory(&self, _pid: u32) -> Result<MemorySnapshot, String> {
        self.gate(
            ProviderKind::Memory,
            MemorySnapshot {
                resident_bytes: 10 << 20,
                virtual_bytes: 200 << 20,
            },
        )
    }

    fn handles(&self, _pid: u32) -> Result<HandleSnapshot, String> {
        self.gate(ProviderKind::Handles, HandleSnapshot { handle_count: 87 })
    }

    fn performance(&self, _pid: u32) -> Result<PerformanceSnapshot, String> {
        self.gate(
            ProviderKind::Performance,
            PerformanceSnapshot {
                cpu_usage_percent: 1.5,
                run_time_secs: 60,
                disk_read_bytes: 0,
                disk_written_bytes: 0,
            },
        )
    }

    fn threads(&self, _pid: u32) -> Result<ThreadSnapshot, String> {
        self.gate(
            ProviderKind::Threads,
            ThreadSnapshot {
                thread_count: 0,
                threads: Vec::new(),
            },
        )
    }

    fn security(&self, _pid: u32) -> Result<SecuritySnapshot, String> {
        self.gate(
            ProviderKind::Security,
            SecuritySnapshot {
                session_id: Some(1),
                user_id: None,
                elevated: Some(false),
            },
        )
    }

    fn modules(&self, _pid: u32) -> Result<ModuleSnapshot, String> {
        self.gate(ProviderKind::Modules, ModuleSnapshot { modules: Vec::new() })
    }

    fn registry(&self, _pid: u32) -> Result<RegistrySnapshot, String> {
        self.gate(
            ProviderKind::Registry,
            RegistrySnapshot {
                app_paths_entry: None,
                run_key_entry: None,
            },
        )
    }

    fn filesystem(&self, _pid: u32) -> Result<FilesystemSnapshot, String> {
        self.gate(
            ProviderKind::Filesystem,
            FilesystemSnapshot {
                current_working_dir: None,
                executable_size_bytes: Some(1 << 20),
                open_file_count: None,
            },
        )
    }

    fn window_state(&self, _pid: u32) -> Result<WindowStateSnapshot, String> {
        self.gate(
            ProviderKind::WindowState,
            WindowStateSnapshot {
                window_count: 1,
                visible_count: 1,
                minimized_count: 0,
                has_foreground: false,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Terminator
// ---------------------------------------------------------------------------

pub struct FakeTerminator {
    outcome: TerminationOutcome,
}

impl FakeTerminator {
    pub fn graceful() -> Self {
        Self {
            outcome: TerminationOutcome::Graceful,
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            outcome: TerminationOutcome::Failed(detail.into()),
        }
    }
}

impl TerminationExecutor for FakeTerminator {
    fn terminate(&self, _pid: u32, _strategy: TerminationStrategy) -> TerminationOutcome {
        self.outcome.clone()
    }
}
