//! Name-keyed process directory.
//!
//! [`ProcessManager`] maps a logical application name to at most one live
//! [`ManagedApplicationContext`].  Launch, lookup, and termination all go
//! through the manager so no two contexts silently compete for the same
//! process.  The map itself is the only state shared across contexts.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::context::ManagedApplicationContext;
use crate::errors::WinCtxError;
use crate::providers::{Collaborators, TerminationOutcome};

// ---------------------------------------------------------------------------
// Launch specification
// ---------------------------------------------------------------------------

/// What to start and how.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Process-wide directory of managed applications.
pub struct ProcessManager {
    collab: Collaborators,
    contexts: RwLock<HashMap<String, Arc<ManagedApplicationContext>>>,
}

impl ProcessManager {
    pub fn new(collab: Collaborators) -> Self {
        Self {
            collab,
            contexts: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide instance, wired to the native collaborators.
    #[cfg(windows)]
    pub fn global() -> &'static ProcessManager {
        use std::sync::OnceLock;
        static GLOBAL: OnceLock<ProcessManager> = OnceLock::new();
        GLOBAL.get_or_init(|| ProcessManager::new(Collaborators::native()))
    }

    /// Start a new OS process and track it under `name`.
    ///
    /// Fails when a live context already holds the name or when the
    /// launch itself fails.  A terminated predecessor is replaced.
    /// Launches are serialized: the registry lock is held across the
    /// spawn so two callers cannot race the same name.
    pub fn launch_and_track(
        &self,
        name: &str,
        spec: &LaunchSpec,
    ) -> Result<Arc<ManagedApplicationContext>, WinCtxError> {
        if name.trim().is_empty() {
            return Err(WinCtxError::InvalidIdentity(
                "application name must not be empty".into(),
            ));
        }

        let mut contexts = self.contexts.write();
        if let Some(existing) = contexts.get(name) {
            if !existing.is_terminated() {
                return Err(WinCtxError::NameAlreadyRegistered(name.to_string()));
            }
            log::debug!("{name}: replacing terminated context (pid {})", existing.pid());
        }

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|e| {
            WinCtxError::LaunchFailed(format!("{}: {e}", spec.program.display()))
        })?;
        let pid = child.id();
        // The child runs detached; the context owns its lifecycle from
        // here on.
        drop(child);

        log::info!("{name}: launched {} as pid {pid}", spec.program.display());

        let context = Arc::new(ManagedApplicationContext::new(
            name,
            pid,
            self.collab.clone(),
        )?);
        contexts.insert(name.to_string(), context.clone());
        Ok(context)
    }

    /// Look up a tracked context, or discover an already-running process
    /// by the name-to-executable convention (`<name>.exe`, case
    /// insensitive).  `None` when nothing matches -- non-fatal.
    pub fn get(&self, name: &str) -> Option<Arc<ManagedApplicationContext>> {
        if let Some(context) = self.contexts.read().get(name) {
            return Some(context.clone());
        }

        let stem = name.to_lowercase();
        let pid = self.collab.introspector.find_pid_by_name(&stem)?;
        log::debug!("{name}: discovered running process pid {pid}");

        match ManagedApplicationContext::new(name, pid, self.collab.clone()) {
            Ok(context) => {
                let context = Arc::new(context);
                let mut contexts = self.contexts.write();
                // A racing discovery may have registered first; keep the
                // incumbent.
                let entry = contexts
                    .entry(name.to_string())
                    .or_insert_with(|| context.clone());
                Some(entry.clone())
            }
            Err(e) => {
                log::warn!("{name}: could not attach to discovered pid {pid}: {e}");
                None
            }
        }
    }

    /// Terminate the named application and drop its registry entry.
    ///
    /// The entry is removed only on confirmed success; a failed
    /// termination keeps the context registered and active.
    pub fn terminate(&self, name: &str) -> Result<TerminationOutcome, WinCtxError> {
        let context = self
            .contexts
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| WinCtxError::UnknownApplication(name.to_string()))?;

        let outcome = context.terminate()?;
        self.contexts.write().remove(name);
        log::info!("{name}: removed from registry ({outcome:?})");
        Ok(outcome)
    }

    /// Names currently registered, terminated entries included.
    pub fn tracked_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.contexts.read().keys().cloned().collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
