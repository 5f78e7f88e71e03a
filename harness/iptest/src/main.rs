//! iptest CLI
//!
//! Runs script and side-by-side conformance suites against a candidate
//! runtime.

use std::io;
use std::path::PathBuf;

use iptest::commands::{
    compare_files, list_categories, list_tests, parse_run_options, run_tests, split_config_arg,
    CommandError,
};

fn main() {
    iptest::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    let result = match command.as_str() {
        "run" => {
            parse_run_options(&args[2..]).and_then(|options| run_tests(&options, io::stdout()))
        }
        "list" => {
            let (config, rest) = split_config_arg(&args[2..]);
            list_tests(rest.first().map(String::as_str), config.as_deref(), io::stdout())
        }
        "categories" => {
            let (config, rest) = split_config_arg(&args[2..]);
            list_categories(rest.first().map(String::as_str), config.as_deref(), io::stdout())
        }
        "sbs" => {
            if args.len() < 3 {
                eprintln!("Usage: iptest sbs <file>... [--config=<path>] [--verbose]");
                std::process::exit(1);
            }

            // Flags go to the run options, everything else is a file
            let (flags, files): (Vec<String>, Vec<String>) =
                args[2..].iter().cloned().partition(|a| a.starts_with('-'));
            let files: Vec<PathBuf> = files.into_iter().map(PathBuf::from).collect();
            parse_run_options(&flags)
                .and_then(|options| compare_files(&files, &options, io::stdout()))
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(0)
        }
        "version" | "--version" | "-V" => {
            println!("iptest {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            Ok(1)
        }
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(CommandError::Usage(message)) => {
            eprintln!("error: {message}");
            eprintln!("Run `iptest help` for usage.");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("iptest: conformance tests for alternate language runtimes");
    println!();
    println!("Usage: iptest <command> [options]");
    println!();
    println!("Commands:");
    println!("  run [selector]        Run a module, a category, or all (default)");
    println!("  list [selector]       List the tests a selector names");
    println!("  categories [test]     List categories, or those containing a test");
    println!("  sbs <file>...         Compare files on the reference and candidate runtimes");
    println!("  help                  Show this help message");
    println!("  version               Show version information");
    println!();
    println!("Run options:");
    println!("  --filter=<text>       Only tests whose name contains <text>");
    println!("  --tag=<name>          Only tests tagged <name>; --tag=-<name> excludes");
    println!("  --known-issue=<n>=on|off  Toggle a known-issue skip");
    println!("  --timeout=<secs>      Per-test time limit (default: 60)");
    println!("  --parallel            Run tests on a thread pool");
    println!("  --no-parallel         Run tests one at a time");
    println!("  --config=<path>       Config file (default: iptest.toml)");
    println!("  -v, --verbose         Show durations");
    println!();
    println!("Exit status: 0 all passed, 1 failures or errors, 2 no tests selected.");
    println!("Set RUST_LOG (e.g. RUST_LOG=iptest=debug) for trace output on stderr.");
}
