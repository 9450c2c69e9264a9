use std::io::{self, IsTerminal, Read};

use tracing_subscriber::EnvFilter;

use ac_core::config::Config;
use ac_core::repl::{run_once, run_repl};

fn print_help() {
    println!("advisorchat — terminal client for the study-advisor chat");
    println!();
    println!("Usage:");
    println!("  advisorchat                   Interactive chat");
    println!("  advisorchat \"question\"        One-shot mode (non-interactive)");
    println!("  echo \"question\" | advisorchat   One-shot mode via stdin pipe");
    println!();
    println!("Options:");
    println!("  --version         Print version");
    println!("  --help            Print this help");
    println!();
    println!("Configuration: ~/.config/advisorchat/config.toml");
    println!("Logging: set RUST_LOG (e.g. RUST_LOG=ac_backend=debug)");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("advisorchat {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = Config::load_or_default();

    // Detect one-shot mode: positional arg (non-flag) or piped stdin
    let non_flag_args: Vec<&String> = args.iter().filter(|a| !a.starts_with('-')).collect();
    let stdin_is_pipe = !io::stdin().is_terminal();

    let message = if let Some(arg) = non_flag_args.first() {
        Some((*arg).clone())
    } else if stdin_is_pipe {
        let mut buf = String::new();
        if io::stdin().read_to_string(&mut buf).is_ok() && !buf.trim().is_empty() {
            Some(buf.trim().to_string())
        } else {
            None
        }
    } else {
        None
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create async runtime: {e}");
            std::process::exit(1);
        }
    };

    let code = match message {
        Some(message) => run_once(&config, &runtime, &message),
        None => run_repl(&config, &runtime),
    };
    std::process::exit(code);
}
