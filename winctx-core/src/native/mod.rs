//! Native collaborator implementations: Win32 window queries, sysinfo
//! process introspection, kernel snapshot providers, and the
//! termination executor.
//!
//! Everything in this module is Windows-only.  The rest of the crate
//! never calls Win32 directly -- it goes through the trait seams in
//! [`crate::providers`], which is what keeps the core logic testable
//! with fakes.

mod process;
mod snapshots;
mod terminate;
mod window;

pub use process::SysinfoIntrospector;
pub use snapshots::NativeSnapshotSuite;
pub use terminate::Win32Terminator;
pub use window::Win32WindowSource;

use windows::Win32::Foundation::{CloseHandle, HANDLE};

/// RAII wrapper closing a kernel handle on drop.
pub(crate) struct HandleGuard(pub HANDLE);

impl Drop for HandleGuard {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }
}
