//! Attach to a running process and dump its managed context as JSON.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "winctx-attach",
    about = "Attach to a process and dump its managed application context as JSON"
)]
struct Args {
    /// Process id to attach to.
    #[arg(long)]
    pid: Option<u32>,

    /// Logical application name.  Without --pid, resolves a running
    /// `<name>.exe`; with --pid, used as the context label.
    #[arg(long)]
    name: Option<String>,

    /// Compact JSON output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

#[cfg(windows)]
fn main() {
    use winctx_core::providers::Collaborators;
    use winctx_core::{ManagedApplicationContext, ProcessManager};

    let args = Args::parse();

    let summary = if let Some(pid) = args.pid {
        let label = args.name.clone().unwrap_or_else(|| format!("pid-{pid}"));
        match ManagedApplicationContext::new(label, pid, Collaborators::native()) {
            Ok(context) => context.summary(),
            Err(e) => {
                eprintln!("Failed to attach to pid {pid}: {e}");
                std::process::exit(1);
            }
        }
    } else if let Some(name) = args.name.as_deref() {
        match ProcessManager::global().get(name) {
            Some(context) => context.summary(),
            None => {
                eprintln!("No running process matches '{name}'");
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("Either --pid or --name is required");
        std::process::exit(2);
    };

    let json = if args.compact {
        serde_json::to_string(&summary).unwrap()
    } else {
        serde_json::to_string_pretty(&summary).unwrap()
    };

    println!("{json}");
}

#[cfg(not(windows))]
fn main() {
    let _ = Args::parse();
    eprintln!("winctx-attach requires Windows");
    std::process::exit(1);
}
