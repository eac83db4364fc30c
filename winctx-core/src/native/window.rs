//! Window enumeration and property reads via the Win32 API.
//!
//! All functions return owned descriptors, never raw handles with
//! lifetimes.  Handles are carried as `isize` across the trait boundary
//! and rehydrated into `HWND` here.

use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;

use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT, TRUE};
use windows::Win32::UI::Input::KeyboardAndMouse::IsWindowEnabled;
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetForegroundWindow, GetWindowRect, GetWindowTextLengthW,
    GetWindowTextW, GetWindowThreadProcessId, IsIconic, IsWindow, IsWindowVisible, IsZoomed,
};

use crate::errors::WinCtxError;
use crate::providers::WindowSource;
use crate::window::{DesktopWindow, WindowBounds, WindowDescriptor};

// ---------------------------------------------------------------------------
// Raw property reads
// ---------------------------------------------------------------------------

fn hwnd(handle: isize) -> HWND {
    HWND(handle as *mut core::ffi::c_void)
}

/// Read the window title (up to its reported length).
fn read_window_title(hwnd: HWND) -> String {
    let len = unsafe { GetWindowTextLengthW(hwnd) };
    if len <= 0 {
        return String::new();
    }
    let mut buf = vec![0u16; (len + 1) as usize];
    let copied = unsafe { GetWindowTextW(hwnd, &mut buf) };
    if copied <= 0 {
        return String::new();
    }
    OsString::from_wide(&buf[..copied as usize])
        .to_string_lossy()
        .into_owned()
}

/// Read the window class name (up to 256 chars).
fn read_class_name(hwnd: HWND) -> String {
    let mut buf = [0u16; 256];
    let len = unsafe { GetClassNameW(hwnd, &mut buf) };
    if len <= 0 {
        return String::new();
    }
    OsString::from_wide(&buf[..len as usize])
        .to_string_lossy()
        .into_owned()
}

/// Get the owning process ID for a window handle.
fn read_pid(hwnd: HWND) -> u32 {
    let mut pid: u32 = 0;
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
    pid
}

fn read_bounds(hwnd: HWND) -> WindowBounds {
    let mut rect = RECT::default();
    if unsafe { GetWindowRect(hwnd, &mut rect) }.is_err() {
        return WindowBounds::ZERO;
    }
    WindowBounds {
        x: rect.left,
        y: rect.top,
        width: rect.right - rect.left,
        height: rect.bottom - rect.top,
    }
}

/// PID owning the current foreground window, or 0.
pub(crate) fn foreground_pid() -> u32 {
    let fg = unsafe { GetForegroundWindow() };
    if fg.is_invalid() {
        return 0;
    }
    read_pid(fg)
}

// ---------------------------------------------------------------------------
// Enumeration callbacks
// ---------------------------------------------------------------------------

struct PidEnumState {
    pid: u32,
    handles: Vec<HWND>,
}

unsafe extern "system" fn enum_pid_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let state = unsafe { &mut *(lparam.0 as *mut PidEnumState) };
    if read_pid(hwnd) == state.pid {
        state.handles.push(hwnd);
    }
    TRUE // continue enumeration
}

unsafe extern "system" fn enum_all_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let handles = unsafe { &mut *(lparam.0 as *mut Vec<HWND>) };
    handles.push(hwnd);
    TRUE
}

/// All top-level windows owned by `pid`, in z-order (topmost first).
pub(crate) fn enumerate_process_windows(pid: u32) -> Result<Vec<HWND>, WinCtxError> {
    let mut state = PidEnumState {
        pid,
        handles: Vec::with_capacity(16),
    };
    unsafe {
        EnumWindows(
            Some(enum_pid_callback),
            LPARAM(&mut state as *mut PidEnumState as isize),
        )
    }
    .map_err(|e| WinCtxError::WindowEnumeration(format!("EnumWindows failed for pid {pid}: {e}")))?;
    Ok(state.handles)
}

// ---------------------------------------------------------------------------
// WindowSource implementation
// ---------------------------------------------------------------------------

/// Win32-backed [`WindowSource`].
#[derive(Default)]
pub struct Win32WindowSource;

impl Win32WindowSource {
    pub fn new() -> Self {
        Self
    }
}

impl WindowSource for Win32WindowSource {
    fn process_windows(&self, pid: u32) -> Result<Vec<isize>, WinCtxError> {
        Ok(enumerate_process_windows(pid)?
            .into_iter()
            .map(|h| h.0 as isize)
            .collect())
    }

    fn is_valid_window(&self, handle: isize) -> bool {
        unsafe { IsWindow(hwnd(handle)) }.as_bool()
    }

    fn probe_window(&self, handle: isize) -> Option<WindowDescriptor> {
        let h = hwnd(handle);
        if !unsafe { IsWindow(h) }.as_bool() {
            return None;
        }

        let class_name = read_class_name(h);
        // A real window always has a class; an empty read means the
        // window died mid-probe.
        if class_name.is_empty() {
            return None;
        }

        Some(WindowDescriptor {
            handle,
            title: read_window_title(h),
            class_name,
            bounds: read_bounds(h),
            visible: unsafe { IsWindowVisible(h) }.as_bool(),
            enabled: unsafe { IsWindowEnabled(h) }.as_bool(),
            minimized: unsafe { IsIconic(h) }.as_bool(),
            maximized: unsafe { IsZoomed(h) }.as_bool(),
            z_order: None,
        })
    }

    fn list_all_windows(&self) -> Vec<DesktopWindow> {
        let mut handles: Vec<HWND> = Vec::with_capacity(256);
        let result = unsafe {
            EnumWindows(
                Some(enum_all_callback),
                LPARAM(&mut handles as *mut Vec<HWND> as isize),
            )
        };
        if let Err(e) = result {
            log::warn!("desktop window enumeration failed: {e}");
            return Vec::new();
        }

        let mut windows = Vec::with_capacity(handles.len());
        for (index, h) in handles.into_iter().enumerate() {
            let Some(mut descriptor) = self.probe_window(h.0 as isize) else {
                continue;
            };
            descriptor.z_order = Some(index as i32);
            windows.push(DesktopWindow {
                pid: read_pid(h),
                descriptor,
            });
        }
        windows
    }
}
