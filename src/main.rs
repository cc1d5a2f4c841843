use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crumbtrail::error::Error;
use crumbtrail::report::{
    diff_runs, format_run, latest_run, load_run, resolve_tag, save_tag, tags_dir_for,
};
use crumbtrail_runtime::{RunFile, DEFAULT_INTERVAL};

#[derive(Parser)]
#[command(
    name = "crumbtrail",
    about = "Render and compare call-tree runs written by crumbtrail-runtime",
    version,
    after_help = "Runs are read from --runs-dir, CRUMBTRAIL_RUNS_DIR, or ~/.crumbtrail/runs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the latest run (or a specific one).
    Report {
        /// Run file path or tag name. If omitted, shows the latest.
        run: Option<String>,

        #[arg(long)]
        runs_dir: Option<PathBuf>,
    },
    /// Compare two runs, each given as a path or a tag.
    Diff {
        a: String,
        b: String,

        #[arg(long)]
        runs_dir: Option<PathBuf>,
    },
    /// Tag the latest run for easy reference.
    Tag {
        name: String,

        #[arg(long)]
        runs_dir: Option<PathBuf>,
    },
    /// Run a built-in instrumented workload and print its trace and reports.
    Demo {
        #[arg(long, default_value_t = 20)]
        iterations: u32,

        /// Length of the last-interval window.
        #[arg(long, default_value_t = DEFAULT_INTERVAL.as_millis() as u64)]
        interval_ms: u64,

        /// Also write a run file into this directory.
        #[arg(long, value_name = "DIR")]
        flush_to: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Commands::Report { run, runs_dir } => cmd_report(run, runs_dir),
        Commands::Diff { a, b, runs_dir } => cmd_diff(&a, &b, runs_dir),
        Commands::Tag { name, runs_dir } => cmd_tag(&name, runs_dir),
        Commands::Demo {
            iterations,
            interval_ms,
            flush_to,
        } => cmd_demo(iterations, interval_ms, flush_to),
    }
}

fn cmd_report(run: Option<String>, runs_dir: Option<PathBuf>) -> Result<(), Error> {
    let run = match run {
        Some(arg) => resolve_run_arg(&arg, runs_dir)?,
        None => load_run(&latest_run(&default_runs_dir(runs_dir)?)?)?,
    };
    print!("{}", format_run(&run));
    Ok(())
}

fn cmd_diff(a: &str, b: &str, runs_dir: Option<PathBuf>) -> Result<(), Error> {
    let run_a = resolve_run_arg(a, runs_dir.clone())?;
    let run_b = resolve_run_arg(b, runs_dir)?;
    print!("{}", diff_runs(&run_a, &run_b));
    Ok(())
}

fn cmd_tag(name: &str, runs_dir: Option<PathBuf>) -> Result<(), Error> {
    let runs_dir = default_runs_dir(runs_dir)?;
    let latest = latest_run(&runs_dir)?;
    save_tag(&tags_dir_for(&runs_dir), name, &latest)?;
    eprintln!("tagged '{name}' -> {}", latest.display());
    Ok(())
}

fn cmd_demo(iterations: u32, interval_ms: u64, flush_to: Option<PathBuf>) -> Result<(), Error> {
    let out = crumbtrail::demo::run(
        iterations,
        Duration::from_millis(interval_ms),
        flush_to.as_deref(),
    )?;
    println!("Trace:\n{}\n", out.trace);
    println!("Since launch:\n{}", out.since_launch);
    if !out.last_interval.is_empty() {
        println!("\nLast interval:\n{}", out.last_interval);
    }
    if let Some(path) = out.run_file {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn resolve_run_arg(arg: &str, runs_dir: Option<PathBuf>) -> Result<RunFile, Error> {
    let path = Path::new(arg);
    if path.exists() {
        return load_run(path);
    }
    let runs_dir = default_runs_dir(runs_dir)?;
    let tagged = resolve_tag(&tags_dir_for(&runs_dir), &runs_dir, arg)?;
    load_run(&tagged)
}

fn default_runs_dir(flag: Option<PathBuf>) -> Result<PathBuf, Error> {
    flag.or_else(crumbtrail_runtime::runs_dir)
        .ok_or(Error::NoRunsDir)
}
