use clap::Parser;
use jit_debug_driver::config::SessionConfig;
use jit_debug_driver::debugger::{DebugContext, GdbSession};
use jit_debug_driver::executor::{scenarios, Runner, Suite};
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Run the JIT debug info scenarios under GDB.
#[derive(Debug, Parser)]
#[command(name = "jit-debug-driver", version)]
struct Opt {
    /// JSON session configuration; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image to run under the debugger.
    #[arg(long)]
    target: Option<PathBuf>,

    /// Debugger executable.
    #[arg(long)]
    gdb: Option<PathBuf>,

    /// Launch argument, appended after the configured ones.
    #[arg(long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Environment variable for the inferior, as KEY=VALUE.
    #[arg(long = "env")]
    env: Vec<String>,

    /// Only run suites whose name starts with this prefix.
    #[arg(long)]
    suite: Option<String>,

    /// Only run cases whose `suite/case` name contains this text.
    #[arg(long)]
    filter: Option<String>,

    /// List the selected cases without running them.
    #[arg(long)]
    list: bool,

    /// Write a JSON report of all case outcomes to this file.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Use -v for debug and -vv for trace output.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let env_filter = match std::env::var_os(EnvFilter::DEFAULT_ENV) {
        Some(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::new("warn"),
    };
    let level = match verbosity {
        0 => None,
        1 => Some(LevelFilter::DEBUG),
        _ => Some(LevelFilter::TRACE),
    };

    // stdout belongs to the case report
    let builder = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr);
    match level {
        Some(level) => builder.with_max_level(level).init(),
        None => builder.init(),
    }
}

fn load_config(opt: &Opt) -> Result<SessionConfig, Box<dyn Error>> {
    let mut config = match &opt.config {
        Some(path) => SessionConfig::from_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(target) = &opt.target {
        config.target = target.clone();
    }
    if let Some(gdb) = &opt.gdb {
        config.gdb = gdb.clone();
    }
    for arg in &opt.args {
        config.args.push(arg.clone())?;
    }
    for pair in &opt.env {
        config.set_env_pair(pair)?;
    }
    Ok(config)
}

fn list(suites: &[Suite<GdbSession>], filter: Option<&str>, out: &mut impl Write) -> io::Result<()> {
    for suite in suites {
        for case in &suite.cases {
            let full = format!("{}/{}", suite.name, case.name);
            if filter.map_or(true, |f| full.contains(f)) {
                match case.skip {
                    Some(reason) => writeln!(out, "{} (skipped: {})", full, reason)?,
                    None => writeln!(out, "{}", full)?,
                }
            }
        }
    }
    Ok(())
}

fn run(opt: Opt) -> Result<i32, Box<dyn Error>> {
    let suites = match &opt.suite {
        Some(prefix) => scenarios::select::<GdbSession>(prefix),
        None => scenarios::all::<GdbSession>(),
    };
    if suites.is_empty() {
        return Err(format!("no suite matches `{}`", opt.suite.unwrap_or_default()).into());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if opt.list {
        list(&suites, opt.filter.as_deref(), &mut out)?;
        return Ok(0);
    }

    let config = load_config(&opt)?;
    config.validate()?;
    tracing::info!(image = %config.target.display(), gdb = %config.gdb.display(), "running scenarios");

    let mut runner = Runner::new(&config, DebugContext::<GdbSession>::start).with_filter(opt.filter.clone());
    let report = runner.run(&suites, &mut out)?;
    writeln!(out)?;
    report.print_summary(&mut out)?;

    if let Some(path) = &opt.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        tracing::info!(path = %path.display(), "report written");
    }
    Ok(report.exit_code())
}

fn main() {
    let opt = Opt::parse();
    init_tracing(opt.verbose);

    match run(opt) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    }
}
