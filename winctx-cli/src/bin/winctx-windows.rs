//! List and classify top-level windows as JSON.

use clap::Parser;
#[cfg(windows)]
use serde::Serialize;
#[cfg(windows)]
use winctx_core::classify::{classify_priority, is_primary_eligible, WindowPriority};
#[cfg(windows)]
use winctx_core::window::WindowDescriptor;

#[derive(Parser)]
#[command(
    name = "winctx-windows",
    about = "List top-level windows with their priority classification as JSON"
)]
struct Args {
    /// Only windows owned by this process id.
    #[arg(long)]
    pid: Option<u32>,

    /// List every top-level window on the desktop.
    #[arg(long)]
    all: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

/// One window plus its derived classification.
#[cfg(windows)]
#[derive(Serialize)]
struct ClassifiedWindow {
    pid: Option<u32>,
    priority: WindowPriority,
    rank: u8,
    primary_eligible: bool,
    #[serde(flatten)]
    descriptor: WindowDescriptor,
}

#[cfg(windows)]
fn classify(pid: Option<u32>, descriptor: WindowDescriptor) -> ClassifiedWindow {
    let priority = classify_priority(&descriptor);
    ClassifiedWindow {
        pid,
        priority,
        rank: priority.rank(),
        primary_eligible: is_primary_eligible(&descriptor),
        descriptor,
    }
}

#[cfg(windows)]
fn main() {
    use winctx_core::native::Win32WindowSource;
    use winctx_core::providers::WindowSource;

    let args = Args::parse();
    let source = Win32WindowSource::new();

    let windows: Vec<ClassifiedWindow> = if args.all {
        source
            .list_all_windows()
            .into_iter()
            .map(|w| classify(Some(w.pid), w.descriptor))
            .collect()
    } else if let Some(pid) = args.pid {
        let handles = source.process_windows(pid).unwrap_or_else(|e| {
            eprintln!("Failed to enumerate windows: {e}");
            std::process::exit(1);
        });
        handles
            .into_iter()
            .filter_map(|h| source.probe_window(h))
            .map(|d| classify(Some(pid), d))
            .collect()
    } else {
        eprintln!("Either --pid or --all is required");
        std::process::exit(2);
    };

    let json = if args.compact {
        serde_json::to_string(&windows).unwrap()
    } else {
        serde_json::to_string_pretty(&windows).unwrap()
    };

    println!("{json}");
}

#[cfg(not(windows))]
fn main() {
    let _ = Args::parse();
    eprintln!("winctx-windows requires Windows");
    std::process::exit(1);
}
