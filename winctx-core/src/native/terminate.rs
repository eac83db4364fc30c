//! Termination-strategy executor.
//!
//! Graceful shutdown is a `WM_CLOSE` post to each of the PID's top-level
//! windows followed by a bounded wait on the process handle.  Escalation
//! is `TerminateProcess`.  The executor only classifies what happened;
//! state transitions live in the context.

use std::time::Duration;

use windows::Win32::Foundation::{LPARAM, WAIT_OBJECT_0, WPARAM};
use windows::Win32::System::Threading::{
    OpenProcess, TerminateProcess, WaitForSingleObject, PROCESS_SYNCHRONIZE, PROCESS_TERMINATE,
};
use windows::Win32::UI::WindowsAndMessaging::{PostMessageW, WM_CLOSE};

use crate::providers::{TerminationExecutor, TerminationOutcome, TerminationStrategy};

use super::window::enumerate_process_windows;
use super::HandleGuard;

/// How long a graceful request may take before escalation.
const GRACEFUL_WAIT: Duration = Duration::from_secs(5);

/// Win32-backed [`TerminationExecutor`].
#[derive(Default)]
pub struct Win32Terminator;

impl Win32Terminator {
    pub fn new() -> Self {
        Self
    }

    /// Post `WM_CLOSE` to every top-level window of the PID.  Returns
    /// the number of windows asked.
    fn request_close(&self, pid: u32) -> usize {
        let handles = match enumerate_process_windows(pid) {
            Ok(handles) => handles,
            Err(e) => {
                log::warn!("close request for pid {pid}: {e}");
                return 0;
            }
        };
        let mut posted = 0usize;
        for hwnd in handles {
            if unsafe { PostMessageW(hwnd, WM_CLOSE, WPARAM(0), LPARAM(0)) }.is_ok() {
                posted += 1;
            }
        }
        posted
    }

    /// Wait up to `timeout` for the process to exit.  A PID that cannot
    /// be opened for synchronization is treated as already gone.
    fn wait_for_exit(&self, pid: u32, timeout: Duration) -> bool {
        let handle = match unsafe { OpenProcess(PROCESS_SYNCHRONIZE, false, pid) } {
            Ok(h) => HandleGuard(h),
            Err(_) => return true,
        };
        let status = unsafe { WaitForSingleObject(handle.0, timeout.as_millis() as u32) };
        status == WAIT_OBJECT_0
    }

    fn force_kill(&self, pid: u32) -> TerminationOutcome {
        let handle = match unsafe { OpenProcess(PROCESS_TERMINATE, false, pid) } {
            Ok(h) => HandleGuard(h),
            // Nothing left to kill.
            Err(_) => return TerminationOutcome::Forced,
        };
        match unsafe { TerminateProcess(handle.0, 1) } {
            Ok(()) => TerminationOutcome::Forced,
            Err(e) => TerminationOutcome::Failed(format!("TerminateProcess({pid}): {e}")),
        }
    }
}

impl TerminationExecutor for Win32Terminator {
    fn terminate(&self, pid: u32, strategy: TerminationStrategy) -> TerminationOutcome {
        match strategy {
            TerminationStrategy::Forced => self.force_kill(pid),

            TerminationStrategy::WindowClose => {
                if self.request_close(pid) == 0 {
                    return TerminationOutcome::Failed(format!(
                        "pid {pid} has no windows to close"
                    ));
                }
                if self.wait_for_exit(pid, GRACEFUL_WAIT) {
                    TerminationOutcome::WindowClosed
                } else {
                    TerminationOutcome::Failed(format!(
                        "pid {pid} survived window-close request"
                    ))
                }
            }

            TerminationStrategy::GracefulOnly => {
                self.request_close(pid);
                if self.wait_for_exit(pid, GRACEFUL_WAIT) {
                    TerminationOutcome::Graceful
                } else {
                    TerminationOutcome::Failed(format!("pid {pid} declined graceful shutdown"))
                }
            }

            TerminationStrategy::GracefulThenForced => {
                self.request_close(pid);
                if self.wait_for_exit(pid, GRACEFUL_WAIT) {
                    TerminationOutcome::Graceful
                } else {
                    log::info!("pid {pid} ignored graceful shutdown, escalating to forced kill");
                    self.force_kill(pid)
                }
            }
        }
    }
}
