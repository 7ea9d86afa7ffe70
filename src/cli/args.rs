//! CLI argument parsing

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    Scan(ScanArgs),
    Report(ReportArgs),
}

/// Scan flags. `None` means "use the config file value, or the default".
#[derive(Debug, Clone, Default)]
pub struct ScanArgs {
    pub path: Option<String>,
    pub output: Option<String>,
    pub error_log: Option<String>,
    pub min_size_mb: Option<f64>,
    pub progress_files: Option<u64>,
    pub progress_dirs: Option<u64>,
    pub flush_every: Option<u64>,
    pub schema: Option<String>,
    pub config: Option<String>,
    pub save_config: Option<String>,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct ReportArgs {
    pub input: String,
    pub top: usize,
    pub json: bool,
}

/// Parse command line arguments
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    if args.len() < 2 {
        return Err("No command specified".to_string());
    }

    let command = match args[1].as_str() {
        "scan" => Command::Scan(parse_scan_args(&args[2..])?),
        "report" => Command::Report(parse_report_args(&args[2..])?),
        _ => return Err(format!("Unknown command: {}", args[1])),
    };

    Ok(CliArgs { command })
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn number<T: std::str::FromStr>(raw: &str, flag: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("{flag} must be a non-negative number"))
}

fn parse_scan_args(args: &[String]) -> Result<ScanArgs, String> {
    let mut scan_args = ScanArgs::default();
    let mut i = 0;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--output" => {
                i += 1;
                scan_args.output = Some(value(args, i, flag)?.to_string());
            }
            "--error-log" => {
                i += 1;
                scan_args.error_log = Some(value(args, i, flag)?.to_string());
            }
            "--min-size-mb" => {
                i += 1;
                let mb: f64 = number(value(args, i, flag)?, flag)?;
                if !mb.is_finite() || mb < 0.0 {
                    return Err(format!("{flag} must be a non-negative number"));
                }
                scan_args.min_size_mb = Some(mb);
            }
            "--progress-files" => {
                i += 1;
                scan_args.progress_files = Some(number(value(args, i, flag)?, flag)?);
            }
            "--progress-dirs" => {
                i += 1;
                scan_args.progress_dirs = Some(number(value(args, i, flag)?, flag)?);
            }
            "--flush-every" => {
                i += 1;
                let rows: u64 = number(value(args, i, flag)?, flag)?;
                if rows == 0 {
                    return Err("--flush-every must be greater than zero".to_string());
                }
                scan_args.flush_every = Some(rows);
            }
            "--schema" => {
                i += 1;
                scan_args.schema = Some(value(args, i, flag)?.to_string());
            }
            "--config" => {
                i += 1;
                scan_args.config = Some(value(args, i, flag)?.to_string());
            }
            "--save-config" => {
                i += 1;
                scan_args.save_config = Some(value(args, i, flag)?.to_string());
            }
            "--quiet" => {
                scan_args.quiet = true;
            }
            arg if !arg.starts_with("--") => {
                if scan_args.path.is_none() {
                    scan_args.path = Some(arg.to_string());
                } else {
                    return Err(format!("Unexpected argument: {arg}"));
                }
            }
            _ => return Err(format!("Unknown option: {flag}")),
        }
        i += 1;
    }

    if scan_args.path.is_none() && scan_args.config.is_none() {
        return Err("Missing required argument: PATH (or --config FILE)".to_string());
    }

    Ok(scan_args)
}

fn parse_report_args(args: &[String]) -> Result<ReportArgs, String> {
    let mut input = String::new();
    let mut top = 20;
    let mut json = false;
    let mut i = 0;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--top" => {
                i += 1;
                top = number(value(args, i, flag)?, flag)?;
            }
            "--json" => {
                json = true;
            }
            arg if !arg.starts_with("--") => {
                if input.is_empty() {
                    input = arg.to_string();
                } else {
                    return Err(format!("Unexpected argument: {arg}"));
                }
            }
            _ => return Err(format!("Unknown option: {flag}")),
        }
        i += 1;
    }

    if input.is_empty() {
        return Err("Missing required argument: CSV_FILE".to_string());
    }

    Ok(ReportArgs { input, top, json })
}
