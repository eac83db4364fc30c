//! The managed application context -- aggregate root of the subsystem.
//!
//! A [`ManagedApplicationContext`] turns a raw PID into a stable handle
//! onto one application: its window set, its primary interactive window,
//! and its most recent kernel snapshots.  Construction either returns a
//! fully-initialized context or an error; no partial contexts exist.
//!
//! # Thread safety
//!
//! Window and snapshot state live behind `parking_lot::RwLock` so reads
//! are concurrent.  `refresh_kernel_snapshots` and `terminate` share one
//! ops mutex: at most one of either is in flight per context, so a
//! refresh can never interleave with a termination.  All accessors return
//! owned clones.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::discovery::{self, DiscoveredWindows};
use crate::errors::WinCtxError;
use crate::providers::{
    Collaborators, ProcessIntelligence, TerminationOutcome, TerminationStrategy,
};
use crate::snapshot::{KernelSnapshots, ProviderKind, SnapshotRefreshReport};
use crate::window::WindowDescriptor;

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// One managed process: identity, windows, kernel snapshots, lifecycle.
pub struct ManagedApplicationContext {
    name: String,
    pid: u32,
    created_at: SystemTime,
    intelligence: ProcessIntelligence,
    collab: Collaborators,

    windows: RwLock<DiscoveredWindows>,
    snapshots: RwLock<KernelSnapshots>,
    terminated: AtomicBool,
    /// Serializes refresh and terminate against each other.
    ops: Mutex<()>,
}

impl std::fmt::Debug for ManagedApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedApplicationContext")
            .field("name", &self.name)
            .field("pid", &self.pid)
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}

impl ManagedApplicationContext {
    /// Attach to a running process.
    ///
    /// Gathers process intelligence (fatal if unavailable), runs an
    /// initial snapshot refresh (partial results tolerated), then runs
    /// window discovery.  The returned context is fully initialized.
    pub fn new(
        name: impl Into<String>,
        pid: u32,
        collab: Collaborators,
    ) -> Result<Self, WinCtxError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(WinCtxError::InvalidIdentity(
                "application name must not be empty".into(),
            ));
        }
        if pid == 0 {
            return Err(WinCtxError::InvalidIdentity(format!(
                "pid must be positive, got {pid}"
            )));
        }

        let intelligence = collab
            .introspector
            .gather_intelligence(pid)
            .ok_or(WinCtxError::ProcessIntelligenceUnavailable { pid })?;

        let context = Self {
            name,
            pid,
            created_at: SystemTime::now(),
            intelligence,
            collab,
            windows: RwLock::new(DiscoveredWindows::default()),
            snapshots: RwLock::new(KernelSnapshots::default()),
            terminated: AtomicBool::new(false),
            ops: Mutex::new(()),
        };

        let report = context.refresh_kernel_snapshots();
        if report.failed() > 0 {
            log::warn!(
                "{}: initial snapshot refresh partial -- {}/{} providers failed",
                context.name,
                report.failed(),
                report.outcomes.len()
            );
        }

        let exe_name = context.intelligence.executable_name();
        let discovered = discovery::discover_window_context(
            &context.name,
            context.pid,
            exe_name.as_deref(),
            context.collab.windows.as_ref(),
        );
        log::debug!(
            "{}: discovered {} windows, primary {:?}",
            context.name,
            discovered.order.len(),
            discovered.primary
        );
        *context.windows.write() = discovered;

        Ok(context)
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Intelligence gathered at attach time.  Immutable for the lifetime
    /// of the context, so a reference is safe to hand out.
    pub fn intelligence(&self) -> &ProcessIntelligence {
        &self.intelligence
    }

    /// Liveness query against the OS, not the terminated flag.
    pub fn is_running(&self) -> bool {
        self.collab.introspector.is_running(self.pid)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminated()
    }

    // -----------------------------------------------------------------------
    // Window queries
    // -----------------------------------------------------------------------

    /// All recorded windows, in discovery insertion order.
    pub fn all_windows(&self) -> Vec<WindowDescriptor> {
        let windows = self.windows.read();
        windows
            .order
            .iter()
            .filter_map(|handle| windows.map.get(handle).cloned())
            .collect()
    }

    pub fn window(&self, handle: isize) -> Option<WindowDescriptor> {
        self.windows.read().map.get(&handle).cloned()
    }

    pub fn window_count(&self) -> usize {
        self.windows.read().order.len()
    }

    pub fn primary_window_handle(&self) -> Option<isize> {
        self.windows.read().primary
    }

    /// The designated automation target.  `None` is a legitimate,
    /// degraded outcome -- callers must check before acting.
    pub fn primary_window(&self) -> Option<WindowDescriptor> {
        let windows = self.windows.read();
        windows
            .primary
            .and_then(|handle| windows.map.get(&handle).cloned())
    }

    // -----------------------------------------------------------------------
    // Kernel snapshots
    // -----------------------------------------------------------------------

    /// Most recent snapshot of each category.
    pub fn kernel_snapshots(&self) -> KernelSnapshots {
        self.snapshots.read().clone()
    }

    pub fn last_refreshed(&self) -> Option<SystemTime> {
        self.snapshots.read().last_refreshed
    }

    /// Query all nine snapshot providers in sequence, storing each
    /// success as it arrives.
    ///
    /// A provider failure does not roll back earlier providers' data;
    /// the report says exactly which categories are behind.  On a
    /// terminated context this is a warn-logged no-op returning a
    /// skipped (stale) report.
    pub fn refresh_kernel_snapshots(&self) -> SnapshotRefreshReport {
        let _guard = self.ops.lock();

        if self.is_terminated() {
            log::warn!("{}: refresh rejected, context is terminated", self.name);
            return SnapshotRefreshReport::skipped();
        }

        let pid = self.pid;
        let suite = self.collab.snapshots.as_ref();
        let mut report = SnapshotRefreshReport::default();

        for kind in ProviderKind::ALL {
            let result = match kind {
                ProviderKind::Memory => suite
                    .memory(pid)
                    .map(|s| self.snapshots.write().memory = Some(s)),
                ProviderKind::Handles => suite
                    .handles(pid)
                    .map(|s| self.snapshots.write().handles = Some(s)),
                ProviderKind::Performance => suite
                    .performance(pid)
                    .map(|s| self.snapshots.write().performance = Some(s)),
                ProviderKind::Threads => suite
                    .threads(pid)
                    .map(|s| self.snapshots.write().threads = Some(s)),
                ProviderKind::Security => suite
                    .security(pid)
                    .map(|s| self.snapshots.write().security = Some(s)),
                ProviderKind::Modules => suite
                    .modules(pid)
                    .map(|s| self.snapshots.write().modules = Some(s)),
                ProviderKind::Registry => suite
                    .registry(pid)
                    .map(|s| self.snapshots.write().registry = Some(s)),
                ProviderKind::Filesystem => suite
                    .filesystem(pid)
                    .map(|s| self.snapshots.write().filesystem = Some(s)),
                ProviderKind::WindowState => suite
                    .window_state(pid)
                    .map(|s| self.snapshots.write().window_state = Some(s)),
            };
            if let Err(ref detail) = result {
                log::debug!("{}: {kind:?} provider failed: {detail}", self.name);
            }
            report.record(kind, result);
        }

        if report.succeeded() > 0 {
            self.snapshots.write().last_refreshed = Some(SystemTime::now());
        }

        report
    }

    // -----------------------------------------------------------------------
    // Termination
    // -----------------------------------------------------------------------

    /// Terminate the process, graceful-first.
    ///
    /// Idempotent: on an already-terminated context this logs and returns
    /// [`TerminationOutcome::AlreadyTerminated`].  Any success
    /// classification clears the window state and flips the context to
    /// terminated (one-way).  Failure leaves the context active and is
    /// always surfaced.
    pub fn terminate(&self) -> Result<TerminationOutcome, WinCtxError> {
        let _guard = self.ops.lock();

        if self.is_terminated() {
            log::info!("{}: terminate called on terminated context, no-op", self.name);
            return Ok(TerminationOutcome::AlreadyTerminated);
        }

        let outcome = self
            .collab
            .terminator
            .terminate(self.pid, TerminationStrategy::GracefulThenForced);

        match outcome {
            TerminationOutcome::Failed(detail) => {
                log::warn!("{}: termination failed: {detail}", self.name);
                Err(WinCtxError::TerminationFailed {
                    pid: self.pid,
                    detail,
                })
            }
            outcome => {
                self.terminated.store(true, Ordering::Release);
                let mut windows = self.windows.write();
                windows.map.clear();
                windows.order.clear();
                windows.primary = None;
                log::info!("{}: terminated ({outcome:?})", self.name);
                Ok(outcome)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Owned, serializable summary of the whole context.
    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            name: self.name.clone(),
            pid: self.pid,
            created_at: self.created_at,
            intelligence: self.intelligence.clone(),
            terminated: self.is_terminated(),
            windows: self.all_windows(),
            primary_window: self.primary_window(),
            snapshots: self.kernel_snapshots(),
        }
    }
}

/// Point-in-time export of a context, for JSON consumers.
#[derive(Debug, Clone, Serialize)]
pub struct ContextSummary {
    pub name: String,
    pub pid: u32,
    pub created_at: SystemTime,
    pub intelligence: ProcessIntelligence,
    pub terminated: bool,
    pub windows: Vec<WindowDescriptor>,
    pub primary_window: Option<WindowDescriptor>,
    pub snapshots: KernelSnapshots,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Freshness;
    use crate::testutil::{desc, test_collab, FakeSnapshotSuite, FakeTerminator, FakeWindowSource};
    use crate::window::WindowBounds;

    const PID: u32 = 1234;

    fn simple_context() -> ManagedApplicationContext {
        let windows = FakeWindowSource::with_windows(
            PID,
            vec![desc(1, "Frame", "Main Window", true, WindowBounds::new(0, 0, 640, 480))],
        );
        ManagedApplicationContext::new("app", PID, test_collab(PID, "app.exe", windows)).unwrap()
    }

    #[test]
    fn test_identity_invariants() {
        let ctx = simple_context();
        assert!(ctx.pid() > 0);
        assert!(!ctx.name().is_empty());
        assert!(ctx.is_active());
        assert!(!ctx.is_terminated());
    }

    #[test]
    fn test_rejects_empty_name_and_zero_pid() {
        let collab = test_collab(PID, "app.exe", FakeWindowSource::with_windows(PID, vec![]));
        assert!(matches!(
            ManagedApplicationContext::new("", PID, collab.clone()),
            Err(WinCtxError::InvalidIdentity(_))
        ));
        assert!(matches!(
            ManagedApplicationContext::new("app", 0, collab),
            Err(WinCtxError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_missing_intelligence_is_fatal() {
        // Collaborators know pid 1234 only; attaching to 99 must fail.
        let collab = test_collab(PID, "app.exe", FakeWindowSource::with_windows(PID, vec![]));
        assert!(matches!(
            ManagedApplicationContext::new("app", 99, collab),
            Err(WinCtxError::ProcessIntelligenceUnavailable { pid: 99 })
        ));
    }

    #[test]
    fn test_construction_populates_windows_and_snapshots() {
        let ctx = simple_context();
        assert_eq!(ctx.window_count(), 1);
        assert_eq!(ctx.primary_window_handle(), Some(1));
        assert!(ctx.last_refreshed().is_some());
        assert!(ctx.kernel_snapshots().memory.is_some());
    }

    #[test]
    fn test_accessors_return_copies() {
        let ctx = simple_context();
        let mut copy = ctx.primary_window().unwrap();
        copy.title = "mutated".into();
        assert_eq!(ctx.primary_window().unwrap().title, "Main Window");
    }

    #[test]
    fn test_partial_refresh_keeps_earlier_results() {
        let windows = FakeWindowSource::with_windows(PID, vec![]);
        let mut collab = test_collab(PID, "app.exe", windows);
        collab.snapshots = std::sync::Arc::new(FakeSnapshotSuite::failing(&[
            ProviderKind::Threads,
            ProviderKind::Modules,
        ]));
        let ctx = ManagedApplicationContext::new("app", PID, collab).unwrap();

        let report = ctx.refresh_kernel_snapshots();
        assert_eq!(report.freshness(), Freshness::Partial);
        assert_eq!(report.failed(), 2);

        let snaps = ctx.kernel_snapshots();
        // Providers ahead of the failures still stored their data.
        assert!(snaps.memory.is_some());
        assert!(snaps.handles.is_some());
        assert!(snaps.threads.is_none());
        assert!(snaps.modules.is_none());
        assert!(snaps.last_refreshed.is_some());
    }

    #[test]
    fn test_terminate_twice_is_idempotent() {
        let ctx = simple_context();
        assert_eq!(ctx.window_count(), 1);

        let first = ctx.terminate().unwrap();
        assert!(first.is_success());
        assert!(ctx.is_terminated());
        assert_eq!(ctx.window_count(), 0);
        assert!(ctx.primary_window().is_none());

        let second = ctx.terminate().unwrap();
        assert_eq!(second, TerminationOutcome::AlreadyTerminated);
        assert!(ctx.is_terminated());
        assert_eq!(ctx.window_count(), 0);
    }

    #[test]
    fn test_failed_termination_leaves_context_active() {
        let windows = FakeWindowSource::with_windows(
            PID,
            vec![desc(1, "Frame", "Main", true, WindowBounds::new(0, 0, 100, 100))],
        );
        let mut collab = test_collab(PID, "app.exe", windows);
        collab.terminator = std::sync::Arc::new(FakeTerminator::failing("stubborn process"));
        let ctx = ManagedApplicationContext::new("app", PID, collab).unwrap();

        assert!(matches!(
            ctx.terminate(),
            Err(WinCtxError::TerminationFailed { pid: 1234, .. })
        ));
        assert!(ctx.is_active());
        // Window state survives a failed termination.
        assert_eq!(ctx.window_count(), 1);
    }

    #[test]
    fn test_refresh_after_terminate_is_skipped() {
        let ctx = simple_context();
        ctx.terminate().unwrap();

        let report = ctx.refresh_kernel_snapshots();
        assert!(report.skipped);
        assert_eq!(report.freshness(), Freshness::Stale);
    }

    #[test]
    fn test_identity_survives_termination() {
        let ctx = simple_context();
        ctx.terminate().unwrap();
        assert_eq!(ctx.name(), "app");
        assert_eq!(ctx.pid(), PID);
        assert!(ctx.intelligence().executable_name().is_some());
    }

    #[test]
    fn test_summary_serializes() {
        let ctx = simple_context();
        let json = serde_json::to_string(&ctx.summary()).unwrap();
        assert!(json.contains("\"pid\":1234"));
        assert!(json.contains("Main Window"));
    }
}
