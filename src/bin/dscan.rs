//! Disk scan CLI (dscan) - Main binary entry point

use dscan::cli::args::{Command, ReportArgs, ScanArgs, parse_args};
use dscan::cli::output::{format_json, format_progress, format_scan_summary, format_text};
use dscan::io::records::read_records;
use dscan::models::ProgressSnapshot;
use dscan::services::report::build_report;
use dscan::{RecordSchema, ScanConfig};
use std::process;
use std::str::FromStr;
use std::sync::Arc;

fn main() {
    // Initialize logger (controlled by RUST_LOG environment variable)
    // Example: RUST_LOG=debug dscan scan /path
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    match args[1].as_str() {
        "--help" | "-h" => {
            print_help();
            return;
        }
        "--version" | "-v" => {
            print_version();
            return;
        }
        _ => {}
    }

    let cli_args = match parse_args(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Use --help for usage information");
            process::exit(2);
        }
    };

    let exit_code = match &cli_args.command {
        Command::Scan(scan_args) => handle_scan(scan_args),
        Command::Report(report_args) => handle_report(report_args),
    };

    process::exit(exit_code);
}

/// Merge the optional config file with command-line overrides.
fn build_config(args: &ScanArgs) -> Result<ScanConfig, String> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path).map_err(|e| e.to_string())?,
        None => ScanConfig::default(),
    };

    if let Some(path) = &args.path {
        config.root.clone_from(path);
    }
    if let Some(output) = &args.output {
        config.output.clone_from(output);
    }
    if let Some(error_log) = &args.error_log {
        config.error_log.clone_from(error_log);
    }
    if let Some(mb) = args.min_size_mb {
        config.min_size_mb = mb;
    }
    if let Some(files) = args.progress_files {
        config.progress_every_files = files;
    }
    if let Some(dirs) = args.progress_dirs {
        config.progress_every_dirs = dirs;
    }
    if let Some(rows) = args.flush_every {
        config.flush_every = rows;
    }
    if let Some(label) = &args.schema {
        config.schema = RecordSchema::from_str(label)?;
    }

    Ok(config)
}

fn handle_scan(args: &ScanArgs) -> i32 {
    let config = match build_config(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return 2;
        }
    };

    if let Some(path) = &args.save_config
        && let Err(e) = config.save(path)
    {
        eprintln!("Error: Failed to save config to {path}: {e}");
        return 4;
    }

    let notifier = if args.quiet {
        None
    } else {
        eprintln!("Scanning: {}", config.root);
        eprintln!("Interrupting (Ctrl+C) keeps every row flushed so far");
        let notifier: dscan::ProgressNotifier = Arc::new(|snapshot: &ProgressSnapshot| {
            eprintln!("{}", format_progress(snapshot));
        });
        Some(notifier)
    };

    let summary = match dscan::run_scan(&config, notifier) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            return match e {
                dscan::Error::InvalidInput(_) => 2,
                dscan::Error::PartialFailure { .. } => 3,
                dscan::Error::Io(_) => 4,
            };
        }
    };

    if !args.quiet {
        eprintln!(
            "{}",
            format_scan_summary(&summary, &config.output, &config.error_log)
        );
    }

    match summary.ensure_complete() {
        Ok(()) => 0,
        Err(e) => {
            if !args.quiet {
                eprintln!("{e}");
            }
            3
        }
    }
}

fn handle_report(args: &ReportArgs) -> i32 {
    let set = match read_records(&args.input) {
        Ok(set) => set,
        Err(e) => {
            eprintln!("Error reading {}: {e}", args.input);
            return match e {
                dscan::Error::InvalidInput(_) => 2,
                _ => 4,
            };
        }
    };

    let report = build_report(&set, args.top);

    if args.json {
        println!("{}", format_json(&report));
    } else {
        print!("{}", format_text(&report));
    }

    0
}

fn print_help() {
    println!("Disk scan CLI (dscan) - Inventory file and cumulative directory sizes");
    println!();
    println!("USAGE:");
    println!("    dscan scan <PATH> [OPTIONS]");
    println!("    dscan scan --config <FILE> [OPTIONS]");
    println!("    dscan report <CSV> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    scan      Walk a directory tree and stream sizes to a CSV file");
    println!("    report    Summarize a CSV produced by scan (complete or interrupted)");
    println!();
    println!("GLOBAL OPTIONS:");
    println!("    -h, --help                 Show this help message");
    println!("    -v, --version              Show version information");
    println!();
    println!("SCAN OPTIONS:");
    println!("    --output <FILE>           CSV output (default: disk_usage.csv)");
    println!("    --error-log <FILE>        Error log (default: disk_scan_errors.log)");
    println!("    --min-size-mb <MB>        Only write files of at least MB megabytes (default: 0)");
    println!("    --schema <NAME>           basic (default) or extended (adds timestamps)");
    println!("    --flush-every <N>         Flush the CSV every N rows (default: 1000)");
    println!("    --progress-files <N>      Report progress every N files, 0 disables (default: 5000)");
    println!("    --progress-dirs <N>       Report progress every N directories, 0 disables (default: 100)");
    println!("    --config <FILE>           Load settings from a JSON file; flags override it");
    println!("    --save-config <FILE>      Write the effective settings to a JSON file");
    println!("    --quiet                   Suppress non-error output");
    println!();
    println!("REPORT OPTIONS:");
    println!("    --top <K>                 Show top K files and directories (default: 20)");
    println!("    --json                    Emit machine-readable output");
    println!();
    println!("EXAMPLES:");
    println!("    dscan scan /home --output home.csv --min-size-mb 10 --schema extended");
    println!("    dscan report home.csv --top 15");
}

fn print_version() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_DATE: &str = env!("GIT_DATE");
    const BUILD_TARGET: &str = env!("BUILD_TARGET");

    println!("dscan {VERSION}");
    println!("Commit: {GIT_HASH} ({GIT_DATE})");
    println!("Target: {BUILD_TARGET}");

    #[cfg(debug_assertions)]
    println!("Build: debug");
    #[cfg(not(debug_assertions))]
    println!("Build: release");
}
