//! Process introspection via the `sysinfo` crate.
//!
//! Replaces shell-out process queries with in-process reads.  The
//! `sysinfo::System` table is owned by the introspector instance and
//! guarded by a `parking_lot::Mutex`; refreshes are targeted at the
//! queried PID so a lookup does not rescan the whole process table.

use std::path::Path;

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::providers::{ProcessIntelligence, ProcessIntrospector};

/// sysinfo-backed [`ProcessIntrospector`].
pub struct SysinfoIntrospector {
    system: Mutex<System>,
}

impl SysinfoIntrospector {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoIntrospector {
    fn default() -> Self {
        Self::new()
    }
}

/// Executable file name without the `.exe` suffix, lower-cased.
fn clean_stem(name: &str) -> String {
    let lower = name.to_lowercase();
    lower
        .strip_suffix(".exe")
        .map(str::to_owned)
        .unwrap_or(lower)
}

impl ProcessIntrospector for SysinfoIntrospector {
    fn gather_intelligence(&self, pid: u32) -> Option<ProcessIntelligence> {
        let mut sys = self.system.lock();
        let pid_obj = Pid::from_u32(pid);
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid_obj]), true);

        let process = sys.process(pid_obj)?;
        Some(ProcessIntelligence {
            executable_path: process.exe().map(Path::to_path_buf),
            command_line: process
                .cmd()
                .iter()
                .map(|s| s.to_string_lossy().into_owned())
                .collect(),
            parent_pid: process.parent().map(|p| p.as_u32()),
            start_time_secs: process.start_time(),
        })
    }

    fn is_running(&self, pid: u32) -> bool {
        let mut sys = self.system.lock();
        let pid_obj = Pid::from_u32(pid);
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid_obj]), true);
        sys.process(pid_obj).is_some()
    }

    fn find_pid_by_name(&self, stem: &str) -> Option<u32> {
        let mut sys = self.system.lock();
        sys.refresh_processes(ProcessesToUpdate::All, true);

        let wanted = stem.to_lowercase();
        let mut substring_hit: Option<u32> = None;
        for (pid, process) in sys.processes() {
            let name = clean_stem(&process.name().to_string_lossy());
            if name == wanted {
                return Some(pid.as_u32());
            }
            if substring_hit.is_none() && name.contains(&wanted) {
                substring_hit = Some(pid.as_u32());
            }
        }
        substring_hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_stem() {
        assert_eq!(clean_stem("Notepad.EXE"), "notepad");
        assert_eq!(clean_stem("explorer.exe"), "explorer");
        assert_eq!(clean_stem("conhost"), "conhost");
    }
}
