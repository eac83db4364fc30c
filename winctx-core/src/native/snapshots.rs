//! Native kernel-snapshot providers.
//!
//! One method per provider: sysinfo for memory/performance/security/
//! filesystem, Toolhelp snapshots for threads and modules, and direct
//! Win32 calls for handle counts, registry footprint, and window state.
//! Every method returns a failure detail string on error; the aggregator
//! decides what to do with partial results.

use std::ffi::c_void;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{ERROR_NO_MORE_FILES, HANDLE};
use windows::Win32::Security::{
    GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, Thread32First, Thread32Next,
    MODULEENTRY32W, TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32, TH32CS_SNAPTHREAD, THREADENTRY32,
};
use windows::Win32::System::Registry::{
    RegGetValueW, HKEY, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, RRF_RT_REG_SZ,
};
use windows::Win32::System::Threading::{
    GetProcessHandleCount, OpenProcess, OpenProcessToken, PROCESS_QUERY_LIMITED_INFORMATION,
};

use crate::providers::SnapshotSuite;
use crate::providers::WindowSource;
use crate::snapshot::{
    FilesystemSnapshot, HandleSnapshot, MemorySnapshot, ModuleInfo, ModuleSnapshot,
    PerformanceSnapshot, RegistrySnapshot, SecuritySnapshot, ThreadInfo, ThreadSnapshot,
    WindowStateSnapshot,
};

use super::window::{foreground_pid, Win32WindowSource};
use super::HandleGuard;

const RUN_KEY: &str = "SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run";
const APP_PATHS_KEY: &str = "SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\App Paths";

/// Win32 + sysinfo [`SnapshotSuite`].
pub struct NativeSnapshotSuite {
    system: Mutex<System>,
    windows: Arc<Win32WindowSource>,
}

impl NativeSnapshotSuite {
    pub fn new(windows: Arc<Win32WindowSource>) -> Self {
        Self {
            system: Mutex::new(System::new()),
            windows,
        }
    }

    /// Refresh the queried PID and run `f` against its process entry.
    fn with_process<T>(
        &self,
        pid: u32,
        f: impl FnOnce(&sysinfo::Process) -> T,
    ) -> Result<T, String> {
        let mut sys = self.system.lock();
        let pid_obj = Pid::from_u32(pid);
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid_obj]), true);
        sys.process(pid_obj)
            .map(f)
            .ok_or_else(|| format!("process {pid} not found"))
    }

    fn executable_name(&self, pid: u32) -> Result<String, String> {
        self.with_process(pid, |p| {
            p.exe()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
        })?
        .ok_or_else(|| format!("process {pid} has no executable path"))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_query_handle(pid: u32) -> Result<HandleGuard, String> {
    unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }
        .map(HandleGuard)
        .map_err(|e| format!("OpenProcess({pid}): {e}"))
}

/// Read a `REG_SZ` value; `value = None` reads the key's default value.
fn read_reg_sz(root: HKEY, subkey: &str, value: Option<&str>) -> Option<String> {
    let subkey_w: Vec<u16> = subkey.encode_utf16().chain(Some(0)).collect();
    let value_w: Option<Vec<u16>> = value.map(|v| v.encode_utf16().chain(Some(0)).collect());
    let value_ptr = value_w
        .as_ref()
        .map(|v| PCWSTR(v.as_ptr()))
        .unwrap_or(PCWSTR::null());

    let mut size: u32 = 0;
    let status = unsafe {
        RegGetValueW(
            root,
            PCWSTR(subkey_w.as_ptr()),
            value_ptr,
            RRF_RT_REG_SZ,
            None,
            None,
            Some(&mut size),
        )
    };
    if status.is_err() || size == 0 {
        return None;
    }

    let mut buf = vec![0u16; size.div_ceil(2) as usize];
    let status = unsafe {
        RegGetValueW(
            root,
            PCWSTR(subkey_w.as_ptr()),
            value_ptr,
            RRF_RT_REG_SZ,
            None,
            Some(buf.as_mut_ptr() as *mut c_void),
            Some(&mut size),
        )
    };
    if status.is_err() {
        return None;
    }

    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    Some(String::from_utf16_lossy(&buf[..len]))
}

// ---------------------------------------------------------------------------
// SnapshotSuite implementation
// ---------------------------------------------------------------------------

impl SnapshotSuite for NativeSnapshotSuite {
    fn memory(&self, pid: u32) -> Result<MemorySnapshot, String> {
        self.with_process(pid, |p| MemorySnapshot {
            resident_bytes: p.memory(),
            virtual_bytes: p.virtual_memory(),
        })
    }

    fn handles(&self, pid: u32) -> Result<HandleSnapshot, String> {
        let handle = open_query_handle(pid)?;
        let mut count: u32 = 0;
        unsafe { GetProcessHandleCount(handle.0, &mut count) }
            .map_err(|e| format!("GetProcessHandleCount({pid}): {e}"))?;
        Ok(HandleSnapshot {
            handle_count: count,
        })
    }

    fn performance(&self, pid: u32) -> Result<PerformanceSnapshot, String> {
        self.with_process(pid, |p| {
            let disk = p.disk_usage();
            PerformanceSnapshot {
                cpu_usage_percent: p.cpu_usage(),
                run_time_secs: p.run_time(),
                disk_read_bytes: disk.total_read_bytes,
                disk_written_bytes: disk.total_written_bytes,
            }
        })
    }

    fn threads(&self, pid: u32) -> Result<ThreadSnapshot, String> {
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPTHREAD, 0) }
            .map_err(|e| format!("CreateToolhelp32Snapshot(threads): {e}"))?;
        let _guard = HandleGuard(snapshot);

        let mut entry = THREADENTRY32 {
            dwSize: std::mem::size_of::<THREADENTRY32>() as u32,
            ..Default::default()
        };
        let mut threads = Vec::new();

        if unsafe { Thread32First(snapshot, &mut entry) }.is_ok() {
            loop {
                if entry.th32OwnerProcessID == pid {
                    threads.push(ThreadInfo {
                        tid: entry.th32ThreadID,
                        base_priority: entry.tpBasePri,
                    });
                }
                if let Err(e) = unsafe { Thread32Next(snapshot, &mut entry) } {
                    if e.code() != ERROR_NO_MORE_FILES.to_hresult() {
                        log::warn!("thread walk for pid {pid} stopped early: {e}");
                    }
                    break;
                }
            }
        }

        Ok(ThreadSnapshot {
            thread_count: threads.len(),
            threads,
        })
    }

    fn security(&self, pid: u32) -> Result<SecuritySnapshot, String> {
        let (session_id, user_id) = self.with_process(pid, |p| {
            (
                p.session_id().map(|s| s.as_u32()),
                p.user_id().map(|u| u.to_string()),
            )
        })?;

        // Elevation is best-effort: access to another user's token may be
        // denied.
        let elevated = open_query_handle(pid).ok().and_then(|process| {
            let mut token = HANDLE::default();
            unsafe { OpenProcessToken(process.0, TOKEN_QUERY, &mut token) }.ok()?;
            let token = HandleGuard(token);
            let mut elevation = TOKEN_ELEVATION::default();
            let mut returned: u32 = 0;
            unsafe {
                GetTokenInformation(
                    token.0,
                    TokenElevation,
                    Some(&mut elevation as *mut TOKEN_ELEVATION as *mut c_void),
                    std::mem::size_of::<TOKEN_ELEVATION>() as u32,
                    &mut returned,
                )
            }
            .ok()?;
            Some(elevation.TokenIsElevated != 0)
        });

        Ok(SecuritySnapshot {
            session_id,
            user_id,
            elevated,
        })
    }

    fn modules(&self, pid: u32) -> Result<ModuleSnapshot, String> {
        let snapshot =
            unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid) }
                .map_err(|e| format!("CreateToolhelp32Snapshot(modules, {pid}): {e}"))?;
        let _guard = HandleGuard(snapshot);

        let mut entry = MODULEENTRY32W {
            dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };
        let mut modules = Vec::new();

        if unsafe { Module32FirstW(snapshot, &mut entry) }.is_ok() {
            loop {
                let name_len = entry
                    .szModule
                    .iter()
                    .position(|&c| c == 0)
                    .unwrap_or(entry.szModule.len());
                modules.push(ModuleInfo {
                    name: String::from_utf16_lossy(&entry.szModule[..name_len]),
                    base_address: entry.modBaseAddr as usize,
                    size: entry.modBaseSize,
                });
                if unsafe { Module32NextW(snapshot, &mut entry) }.is_err() {
                    break;
                }
            }
        }

        Ok(ModuleSnapshot { modules })
    }

    fn registry(&self, pid: u32) -> Result<RegistrySnapshot, String> {
        let exe = self.executable_name(pid)?;
        let stem = exe.strip_suffix(".exe").unwrap_or(&exe);

        Ok(RegistrySnapshot {
            app_paths_entry: read_reg_sz(
                HKEY_LOCAL_MACHINE,
                &format!("{APP_PATHS_KEY}\\{exe}"),
                None,
            ),
            run_key_entry: read_reg_sz(HKEY_CURRENT_USER, RUN_KEY, Some(stem)),
        })
    }

    fn filesystem(&self, pid: u32) -> Result<FilesystemSnapshot, String> {
        let (cwd, exe) = self.with_process(pid, |p| {
            (
                p.cwd().map(Path::to_path_buf),
                p.exe().map(Path::to_path_buf),
            )
        })?;

        let executable_size_bytes = exe.and_then(|path| std::fs::metadata(path).ok().map(|m| m.len()));

        Ok(FilesystemSnapshot {
            current_working_dir: cwd,
            executable_size_bytes,
            // Per-process open-file inventory needs an NT-level walk;
            // reported as unavailable.
            open_file_count: None,
        })
    }

    fn window_state(&self, pid: u32) -> Result<WindowStateSnapshot, String> {
        let handles = self
            .windows
            .process_windows(pid)
            .map_err(|e| e.to_string())?;

        let mut window_count = 0usize;
        let mut visible_count = 0usize;
        let mut minimized_count = 0usize;
        for handle in handles {
            let Some(descriptor) = self.windows.probe_window(handle) else {
                continue;
            };
            window_count += 1;
            if descriptor.visible {
                visible_count += 1;
            }
            if descriptor.minimized {
                minimized_count += 1;
            }
        }

        Ok(WindowStateSnapshot {
            window_count,
            visible_count,
            minimized_count,
            has_foreground: foreground_pid() == pid,
        })
    }
}
