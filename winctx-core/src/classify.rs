//! Window-class pattern tables and priority classification.
//!
//! Classification is a pure function from [`WindowDescriptor`] to
//! [`WindowPriority`], evaluated as a fixed decision table -- first match
//! wins.  Every class-name pattern the subsystem recognises lives in the
//! closed [`WindowClassPattern`] enumeration so the whole scheme is
//! auditable in one place.
//!
//! Rank numbering is part of the contract: lower number = higher
//! priority, 0 = not eligible as primary.  The scale jumps from 1 to 4;
//! only the relative order matters and nothing downstream may assume the
//! ranks are contiguous.

use serde::Serialize;

use crate::window::WindowDescriptor;

// ---------------------------------------------------------------------------
// Class-name pattern tables
// ---------------------------------------------------------------------------

/// Exact console-host window classes.
const CONSOLE_CLASSES: &[&str] = &[
    // Legacy conhost surface.
    "ConsoleWindowClass",
    // Windows Terminal host surface.
    "CASCADIA_HOSTING_WINDOW_CLASS",
    // ConPTY-backed pseudo-console surface.
    "PseudoConsoleWindow",
];

/// Desktop shell, taskbar, tray, and modern UI host classes.  Windows with
/// these classes are infrastructure, never interactive primaries.
const SYSTEM_SHELL_CLASSES: &[&str] = &[
    "Progman",
    "WorkerW",
    "Shell_TrayWnd",
    "Shell_SecondaryTrayWnd",
    "TrayNotifyWnd",
    "NotifyIconOverflowWindow",
    "ApplicationFrameWindow",
    "Windows.UI.Core.CoreWindow",
];

/// File-manager folder-view windows match on this substring.
const SHELL_FOLDER_CLASS: &str = "CabinetWClass";

/// Legacy dialog class.
const LEGACY_DIALOG_CLASS: &str = "#32770";

/// Every class-name pattern the classifier recognises.
///
/// Keeping the patterns in one closed enumeration (instead of substring
/// checks scattered through the selection logic) keeps the decision table
/// testable as a pure function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowClassPattern {
    /// Exact match against a known console-host class, or any class
    /// containing "Console".
    ConsoleHost,
    /// ConPTY pseudo-console surface.
    PseudoConsole,
    /// Exact match against a shell/taskbar/tray/modern-host class.
    SystemShell,
    /// Class contains "CabinetWClass" -- a file-manager folder view.
    ShellFolderView,
    /// Class contains "Dialog" or equals the legacy "#32770".
    Dialog,
    /// Class contains "Tool" or "Popup".
    ToolOrPopup,
}

impl WindowClassPattern {
    /// Test a class name against this pattern.
    pub fn matches(self, class_name: &str) -> bool {
        match self {
            WindowClassPattern::ConsoleHost => {
                CONSOLE_CLASSES.contains(&class_name) || class_name.contains("Console")
            }
            WindowClassPattern::PseudoConsole => class_name == "PseudoConsoleWindow",
            WindowClassPattern::SystemShell => SYSTEM_SHELL_CLASSES.contains(&class_name),
            WindowClassPattern::ShellFolderView => class_name.contains(SHELL_FOLDER_CLASS),
            WindowClassPattern::Dialog => {
                class_name == LEGACY_DIALOG_CLASS || class_name.contains("Dialog")
            }
            WindowClassPattern::ToolOrPopup => {
                class_name.contains("Tool") || class_name.contains("Popup")
            }
        }
    }
}

pub fn is_console_class(class_name: &str) -> bool {
    WindowClassPattern::ConsoleHost.matches(class_name)
}

pub fn is_system_shell_class(class_name: &str) -> bool {
    WindowClassPattern::SystemShell.matches(class_name)
}

pub fn is_shell_folder_class(class_name: &str) -> bool {
    WindowClassPattern::ShellFolderView.matches(class_name)
}

// ---------------------------------------------------------------------------
// Priority classification
// ---------------------------------------------------------------------------

/// Priority class of a window, lower rank = higher priority.
///
/// The ranks carry the original integers of the decision table; 2 and 3
/// are intentionally absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPriority {
    /// Visible, enabled console-host window with a real surface.
    Console,
    /// Titled application window outside the system shell.
    Standard,
    /// Dialog-class window.
    Dialog,
    /// Tool or popup window.
    Utility,
    /// Console-host window that is hidden, disabled, or surfaceless.
    ConsoleFallback,
    /// Not eligible as primary.
    Ineligible,
}

impl WindowPriority {
    /// Numeric rank for ordering.  Lower wins; 0 means ineligible.
    pub fn rank(self) -> u8 {
        match self {
            WindowPriority::Console => 1,
            WindowPriority::Standard => 4,
            WindowPriority::Dialog => 5,
            WindowPriority::Utility => 6,
            WindowPriority::ConsoleFallback => 7,
            WindowPriority::Ineligible => 0,
        }
    }

    pub fn is_eligible(self) -> bool {
        self.rank() > 0
    }
}

/// Classify a window into its priority class.
///
/// The table is evaluated top to bottom; the first matching rule wins.
pub fn classify_priority(window: &WindowDescriptor) -> WindowPriority {
    let console = WindowClassPattern::ConsoleHost.matches(&window.class_name);

    // Rule 1: a console surface that is actually interactive.
    if console && window.visible && window.enabled && !window.bounds.is_degenerate() {
        return WindowPriority::Console;
    }

    // Rule 4: a titled window outside the system shell.
    if !window.title.is_empty() && !WindowClassPattern::SystemShell.matches(&window.class_name) {
        return WindowPriority::Standard;
    }

    // Rule 5: dialogs.
    if WindowClassPattern::Dialog.matches(&window.class_name) {
        return WindowPriority::Dialog;
    }

    // Rule 6: tool and popup windows.
    if WindowClassPattern::ToolOrPopup.matches(&window.class_name) {
        return WindowPriority::Utility;
    }

    // Rule 7: console windows that failed rule 1 -- fallback only.
    if console {
        return WindowPriority::ConsoleFallback;
    }

    WindowPriority::Ineligible
}

/// Whether a window may be selected as the primary automation target.
///
/// A console window with a zero-area rectangle is rejected even when
/// otherwise eligible: it is a hidden infrastructure window, not the
/// visible terminal surface.
pub fn is_primary_eligible(window: &WindowDescriptor) -> bool {
    if !window.visible || !window.enabled {
        return false;
    }

    let console = WindowClassPattern::ConsoleHost.matches(&window.class_name);
    let pseudo = WindowClassPattern::PseudoConsole.matches(&window.class_name);

    if window.title.is_empty() && !console && !pseudo {
        return false;
    }

    if console && window.bounds.is_degenerate() {
        return false;
    }

    classify_priority(window).is_eligible()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
