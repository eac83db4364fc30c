//! Terminate a process by PID or tracked name.

use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(
    name = "winctx-kill",
    about = "Terminate a process through the winctx termination executor"
)]
struct Args {
    /// Process id to terminate.
    #[arg(long)]
    pid: Option<u32>,

    /// Logical application name (resolves a running `<name>.exe`).
    #[arg(long)]
    name: Option<String>,

    /// Escalation strategy.
    #[arg(long, value_enum, default_value = "graceful-then-forced")]
    strategy: StrategyArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    GracefulThenForced,
    GracefulOnly,
    Forced,
    WindowClose,
}

#[cfg(windows)]
fn main() {
    use winctx_core::providers::{Collaborators, TerminationStrategy};
    use winctx_core::ProcessManager;

    let args = Args::parse();
    let strategy = match args.strategy {
        StrategyArg::GracefulThenForced => TerminationStrategy::GracefulThenForced,
        StrategyArg::GracefulOnly => TerminationStrategy::GracefulOnly,
        StrategyArg::Forced => TerminationStrategy::Forced,
        StrategyArg::WindowClose => TerminationStrategy::WindowClose,
    };

    let outcome = if let Some(pid) = args.pid {
        Collaborators::native().terminator.terminate(pid, strategy)
    } else if let Some(name) = args.name.as_deref() {
        if ProcessManager::global().get(name).is_none() {
            eprintln!("No running process matches '{name}'");
            std::process::exit(1);
        }
        match ProcessManager::global().terminate(name) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Termination failed: {e}");
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("Either --pid or --name is required");
        std::process::exit(2);
    };

    println!("{}", serde_json::to_string(&outcome).unwrap());
    if !outcome.is_success() {
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
fn main() {
    let _ = Args::parse();
    eprintln!("winctx-kill requires Windows");
    std::process::exit(1);
}
