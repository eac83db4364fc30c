//! Window discovery and primary-window selection.
//!
//! Runs once per context, at construction.  Enumerates the PID's
//! top-level windows, records a bounded set of descriptors, and picks a
//! single primary window by priority rank.  Two process families get
//! special handling because the visible surface may live under a
//! different PID than the one that was launched:
//!
//! - console launchers (the console surface is hosted by conhost or the
//!   terminal app, not the launched shell),
//! - the file-manager shell (a delegated launch hands the folder window
//!   to an already-running shell process).
//!
//! Discovery failures never abort construction: they are logged and the
//! context continues with whatever was found, down to zero windows.

use std::collections::HashMap;

use crate::classify::{self, classify_priority, is_primary_eligible};
use crate::providers::WindowSource;
use crate::window::WindowDescriptor;

/// Upper bound on descriptors recorded per process.  Windows beyond this
/// are ignored with a warning to cap worst-case enumeration cost.
pub const MAX_TRACKED_WINDOWS: usize = 150;

/// Executables whose launched PID rarely hosts the visible console.
const CONSOLE_LAUNCHERS: &[&str] = &[
    "cmd.exe",
    "powershell.exe",
    "pwsh.exe",
    "wt.exe",
    "conhost.exe",
    "openconsole.exe",
];

/// The file-manager shell executable.
const SHELL_EXECUTABLE: &str = "explorer.exe";

/// Folder titles the shell uses for windows opened without an explicit
/// path.
const WELL_KNOWN_FOLDER_TITLES: &[&str] = &[
    "This PC",
    "File Explorer",
    "Home",
    "Desktop",
    "Documents",
    "Downloads",
    "Pictures",
    "Music",
    "Videos",
    "Recycle Bin",
];

// ---------------------------------------------------------------------------
// Process families
// ---------------------------------------------------------------------------

/// Which discovery special case applies to a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessFamily {
    /// The file-manager shell: only folder-view windows are candidates.
    Shell,
    /// A console launcher: the real surface is searched across processes.
    ConsoleLauncher,
    /// No special casing.
    Standard,
}

impl ProcessFamily {
    /// Classify by lower-cased executable file name.
    pub fn of(executable_name: Option<&str>) -> Self {
        match executable_name {
            Some(name) if name == SHELL_EXECUTABLE => ProcessFamily::Shell,
            Some(name) if CONSOLE_LAUNCHERS.contains(&name) => ProcessFamily::ConsoleLauncher,
            _ => ProcessFamily::Standard,
        }
    }
}

// ---------------------------------------------------------------------------
// Result type
// ---------------------------------------------------------------------------

/// Everything discovery produced: the bounded descriptor set in
/// enumeration order and the chosen primary, if any.
#[derive(Debug, Default)]
pub struct DiscoveredWindows {
    pub map: HashMap<isize, WindowDescriptor>,
    /// Insertion order of `map` keys.
    pub order: Vec<isize>,
    pub primary: Option<isize>,
}

impl DiscoveredWindows {
    fn insert(&mut self, descriptor: WindowDescriptor) {
        if self.map.insert(descriptor.handle, descriptor.clone()).is_none() {
            self.order.push(descriptor.handle);
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Enumerate, record, and select.  `executable_name` drives the
/// process-family special cases.
pub fn discover_window_context(
    app_name: &str,
    pid: u32,
    executable_name: Option<&str>,
    source: &dyn WindowSource,
) -> DiscoveredWindows {
    let family = ProcessFamily::of(executable_name);
    let mut discovered = DiscoveredWindows::default();

    // Console launchers: search the whole desktop for the hosting surface
    // before looking at the PID's own windows.
    let adopted = if family == ProcessFamily::ConsoleLauncher {
        find_console_surface(source)
    } else {
        None
    };

    record_own_windows(app_name, pid, source, &mut discovered);

    if let Some(window) = adopted {
        log::info!(
            "{app_name}: adopted cross-process console window {:#x} (class {})",
            window.handle,
            window.class_name
        );
        let handle = window.handle;
        discovered.insert(window);
        discovered.primary = Some(handle);
        return discovered;
    }

    select_primary(app_name, family, &mut discovered);

    // Shell-delegated launch: the launched PID owns no folder window
    // because an already-running shell took over.  Search the desktop.
    if family == ProcessFamily::Shell && discovered.primary.is_none() {
        if let Some(window) = find_shell_folder_surface(source) {
            log::info!(
                "{app_name}: adopted cross-process folder window {:#x} (\"{}\")",
                window.handle,
                window.title
            );
            let handle = window.handle;
            discovered.insert(window);
            discovered.primary = Some(handle);
        }
    }

    if discovered.primary.is_none() {
        log::warn!("{app_name}: no eligible primary window for pid {pid}");
    }

    discovered
}

/// Probe the PID's own windows into the descriptor set, bounded by
/// [`MAX_TRACKED_WINDOWS`].
fn record_own_windows(
    app_name: &str,
    pid: u32,
    source: &dyn WindowSource,
    discovered: &mut DiscoveredWindows,
) {
    let handles = match source.process_windows(pid) {
        Ok(handles) => handles,
        Err(e) => {
            log::warn!("{app_name}: window enumeration failed for pid {pid}: {e}");
            return;
        }
    };

    if handles.len() > MAX_TRACKED_WINDOWS {
        log::warn!(
            "{app_name}: pid {pid} owns {} top-level windows, recording first {MAX_TRACKED_WINDOWS}",
            handles.len()
        );
    }

    for (index, handle) in handles.into_iter().enumerate() {
        if discovered.order.len() >= MAX_TRACKED_WINDOWS {
            break;
        }
        if !source.is_valid_window(handle) {
            continue;
        }
        match source.probe_window(handle) {
            Some(mut descriptor) => {
                if descriptor.z_order.is_none() {
                    descriptor.z_order = Some(index as i32);
                }
                discovered.insert(descriptor);
            }
            None => {
                log::debug!("{app_name}: window {handle:#x} vanished during probe, skipping");
            }
        }
    }
}

/// The per-window promotion loop: first eligible window wins, later ones
/// replace it only on a strictly lower rank.
fn select_primary(app_name: &str, family: ProcessFamily, discovered: &mut DiscoveredWindows) {
    let mut primary: Option<(isize, u8)> = None;

    for &handle in &discovered.order {
        let window = &discovered.map[&handle];

        // The shell process exposes many non-interactive infrastructure
        // windows; only folder views are candidates.
        if family == ProcessFamily::Shell && !classify::is_shell_folder_class(&window.class_name) {
            log::debug!(
                "{app_name}: shell window {:#x} (class {}) is not a folder view, discarded",
                window.handle,
                window.class_name
            );
            continue;
        }

        if !is_primary_eligible(window) {
            continue;
        }

        let rank = classify_priority(window).rank();
        match primary {
            None => primary = Some((handle, rank)),
            Some((_, current)) if rank < current => primary = Some((handle, rank)),
            Some(_) => {}
        }
    }

    discovered.primary = primary.map(|(handle, _)| handle);
}

/// Desktop-wide search for a live console surface, any PID.
fn find_console_surface(source: &dyn WindowSource) -> Option<WindowDescriptor> {
    source
        .list_all_windows()
        .into_iter()
        .map(|w| w.descriptor)
        .find(|d| {
            classify::is_console_class(&d.class_name)
                && d.visible
                && d.enabled
                && !d.bounds.is_degenerate()
        })
}

/// Desktop-wide search for a folder-view window that looks like the
/// result of a delegated launch.
fn find_shell_folder_surface(source: &dyn WindowSource) -> Option<WindowDescriptor> {
    source
        .list_all_windows()
        .into_iter()
        .map(|w| w.descriptor)
        .find(|d| {
            classify::is_shell_folder_class(&d.class_name)
                && d.visible
                && d.enabled
                && looks_like_folder_title(&d.title)
        })
}

/// Heuristic for folder-view titles: a drive-letter path, a well-known
/// folder name, or no title at all.
fn looks_like_folder_title(title: &str) -> bool {
    if title.is_empty() {
        return true;
    }
    let mut chars = title.chars();
    if let (Some(first), Some(second)) = (chars.next(), chars.next()) {
        if first.is_ascii_alphabetic() && second == ':' {
            return true;
        }
    }
    WELL_KNOWN_FOLDER_TITLES.contains(&title)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{desc, FakeWindowSource};
    use crate::window::{DesktopWindow, WindowBounds};

    const PID: u32 = 4242;

    #[test]
    fn test_family_classification() {
        assert_eq!(ProcessFamily::of(Some("explorer.exe")), ProcessFamily::Shell);
        assert_eq!(ProcessFamily::of(Some("cmd.exe")), ProcessFamily::ConsoleLauncher);
        assert_eq!(ProcessFamily::of(Some("wt.exe")), ProcessFamily::ConsoleLauncher);
        assert_eq!(ProcessFamily::of(Some("notepad.exe")), ProcessFamily::Standard);
        assert_eq!(ProcessFamily::of(None), ProcessFamily::Standard);
    }

    #[test]
    fn test_lower_rank_promotes_over_earlier_window() {
        let source = FakeWindowSource::with_windows(
            PID,
            vec![
                desc(1, "#32770", "Save As", true, WindowBounds::new(0, 0, 400, 300)),
                desc(2, "ConsoleWindowClass", "cmd", true, WindowBounds::new(0, 0, 800, 400)),
            ],
        );
        let d = discover_window_context("app", PID, Some("notepad.exe"), &source);
        // The rank-1 console replaces the first-discovered rank-4 window.
        assert_eq!(d.primary, Some(2));
        assert_eq!(d.order, vec![1, 2]);
    }

    #[test]
    fn test_equal_rank_keeps_first_discovered() {
        let source = FakeWindowSource::with_windows(
            PID,
            vec![
                desc(10, "FrameA", "Window A", true, WindowBounds::new(0, 0, 100, 100)),
                desc(11, "FrameB", "Window B", true, WindowBounds::new(0, 0, 100, 100)),
            ],
        );
        let d = discover_window_context("app", PID, Some("app.exe"), &source);
        assert_eq!(d.primary, Some(10));
    }

    #[test]
    fn test_shell_family_only_accepts_folder_views() {
        let source = FakeWindowSource::with_windows(
            PID,
            vec![
                desc(1, "Progman", "Program Manager", true, WindowBounds::new(0, 0, 1920, 1080)),
                desc(2, "CabinetWClass", "C:\\Users", true, WindowBounds::new(0, 0, 800, 600)),
            ],
        );
        let d = discover_window_context("shell", PID, Some("explorer.exe"), &source);
        assert_eq!(d.primary, Some(2));
        // Progman is recorded but never selected.
        assert!(d.map.contains_key(&1));
    }

    #[test]
    fn test_shell_family_without_folder_views_searches_desktop() {
        let mut source = FakeWindowSource::with_windows(
            PID,
            vec![desc(1, "Progman", "Program Manager", true, WindowBounds::new(0, 0, 1920, 1080))],
        );
        source.desktop = vec![DesktopWindow {
            pid: 9001,
            descriptor: desc(77, "CabinetWClass", "Downloads", true, WindowBounds::new(0, 0, 800, 600)),
        }];
        let d = discover_window_context("shell", PID, Some("explorer.exe"), &source);
        assert_eq!(d.primary, Some(77));
        assert!(d.map.contains_key(&77));
    }

    #[test]
    fn test_console_launcher_adopts_cross_process_surface() {
        let mut source = FakeWindowSource::with_windows(PID, vec![]);
        source.desktop = vec![
            DesktopWindow {
                pid: 555,
                descriptor: desc(
                    40,
                    "CASCADIA_HOSTING_WINDOW_CLASS",
                    "Windows Terminal",
                    true,
                    WindowBounds::new(0, 0, 1200, 800),
                ),
            },
        ];
        let d = discover_window_context("term", PID, Some("cmd.exe"), &source);
        assert_eq!(d.primary, Some(40));
        // The adopted window is part of the descriptor set.
        assert!(d.map.contains_key(&40));
        assert_eq!(d.order, vec![40]);
    }

    #[test]
    fn test_console_search_skips_degenerate_and_hidden_surfaces() {
        let mut source = FakeWindowSource::with_windows(PID, vec![]);
        source.desktop = vec![
            DesktopWindow {
                pid: 555,
                descriptor: desc(41, "ConsoleWindowClass", "ghost", true, WindowBounds::ZERO),
            },
            DesktopWindow {
                pid: 556,
                descriptor: desc(
                    42,
                    "ConsoleWindowClass",
                    "hidden",
                    false,
                    WindowBounds::new(0, 0, 800, 400),
                ),
            },
            DesktopWindow {
                pid: 557,
                descriptor: desc(
                    43,
                    "ConsoleWindowClass",
                    "real",
                    true,
                    WindowBounds::new(0, 0, 800, 400),
                ),
            },
        ];
        let d = discover_window_context("term", PID, Some("cmd.exe"), &source);
        assert_eq!(d.primary, Some(43));
    }

    #[test]
    fn test_console_adoption_skips_own_window_promotion() {
        let mut source = FakeWindowSource::with_windows(
            PID,
            vec![desc(1, "OwnFrame", "Launcher", true, WindowBounds::new(0, 0, 300, 200))],
        );
        source.desktop = vec![DesktopWindow {
            pid: 555,
            descriptor: desc(
                40,
                "ConsoleWindowClass",
                "cmd",
                true,
                WindowBounds::new(0, 0, 800, 400),
            ),
        }];
        let d = discover_window_context("term", PID, Some("cmd.exe"), &source);
        // The adopted surface wins; the PID's own eligible window is
        // recorded but never promoted.
        assert_eq!(d.primary, Some(40));
        assert!(d.map.contains_key(&1));
    }

    #[test]
    fn test_enumeration_bounded_at_max_tracked() {
        let windows: Vec<_> = (0..500)
            .map(|i| {
                desc(
                    i as isize + 1,
                    "Frame",
                    &format!("Window {i}"),
                    true,
                    WindowBounds::new(0, 0, 100, 100),
                )
            })
            .collect();
        let source = FakeWindowSource::with_windows(PID, windows);
        let d = discover_window_context("app", PID, Some("app.exe"), &source);
        assert_eq!(d.map.len(), MAX_TRACKED_WINDOWS);
        assert_eq!(d.order.len(), MAX_TRACKED_WINDOWS);
    }

    #[test]
    fn test_zero_windows_is_valid_degraded_state() {
        let source = FakeWindowSource::with_windows(PID, vec![]);
        let d = discover_window_context("app", PID, Some("app.exe"), &source);
        assert!(d.map.is_empty());
        assert!(d.primary.is_none());
    }

    #[test]
    fn test_folder_title_heuristics() {
        assert!(looks_like_folder_title(""));
        assert!(looks_like_folder_title("C:\\Users\\dev"));
        assert!(looks_like_folder_title("Downloads"));
        assert!(!looks_like_folder_title("Mozilla Firefox"));
    }
}
