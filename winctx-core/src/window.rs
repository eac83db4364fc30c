//! Window value types.
//!
//! [`WindowDescriptor`] is an immutable, owned snapshot of one top-level
//! window's identity, geometry, and visual state.  Descriptors are built
//! once from validated OS query results and never mutated afterwards,
//! which is what makes clone-out accessors on the context safe: a caller
//! holding a copy can never reach back into shared state.

use serde::Serialize;

use crate::classify;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Window bounding rectangle in screen coordinates.
///
/// May be degenerate (zero-sized) -- hidden infrastructure windows often
/// report a zero-area rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowBounds {
    pub const ZERO: WindowBounds = WindowBounds {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A zero-area rectangle marks a window with no visible surface.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Owned snapshot of a single top-level window.
///
/// `minimized`, `maximized`, and `z_order` are best-effort: providers that
/// cannot answer leave them `false` / `None`.
#[derive(Debug, Clone, Serialize)]
pub struct WindowDescriptor {
    /// Opaque OS window identifier, unique within a session.
    pub handle: isize,
    /// Window title.  May be empty.
    pub title: String,
    /// Window class name.  Never empty for a real window.
    pub class_name: String,
    pub bounds: WindowBounds,
    pub visible: bool,
    pub enabled: bool,
    pub minimized: bool,
    pub maximized: bool,
    /// Best-effort z-order (0 = topmost at enumeration time).
    pub z_order: Option<i32>,
}

impl WindowDescriptor {
    /// True when the class name matches a known console-host class.
    pub fn is_console_window(&self) -> bool {
        classify::is_console_class(&self.class_name)
    }

    /// True when the class name belongs to the desktop shell, taskbar,
    /// tray, or a modern UI host.
    pub fn is_system_window(&self) -> bool {
        classify::is_system_shell_class(&self.class_name)
    }
}

/// A window paired with its owning process id.
///
/// Item type of the cross-process desktop lister used by the console and
/// shell fallback searches.
#[derive(Debug, Clone, Serialize)]
pub struct DesktopWindow {
    pub pid: u32,
    #[serde(flatten)]
    pub descriptor: WindowDescriptor,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
