//! tailor command line

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tailor_loader::{Builder, LoadRestriction};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("tailor")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Customize manifests while keeping their references intact")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("warn")
                .help("Log filter when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("build")
                .about("Build a directory holding a tailor.yaml")
                .arg(
                    Arg::new("dir")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Build directory"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write documents to this file instead of stdout"),
                )
                .arg(
                    Arg::new("load-restrictor")
                        .long("load-restrictor")
                        .default_value("root-only")
                        .value_parser(["root-only", "none"])
                        .help("Whether files may be loaded from outside their build directory"),
                ),
        )
}

fn init_tracing(matches: &ArgMatches) {
    let level = matches.get_one::<String>("log-level").map_or("warn", String::as_str);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if matches.get_flag("json-logs") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build(args: &ArgMatches) -> Result<()> {
    let dir = args
        .get_one::<PathBuf>("dir")
        .map_or_else(|| PathBuf::from("."), Clone::clone);
    let restriction = match args.get_one::<String>("load-restrictor").map(String::as_str) {
        Some("none") => LoadRestriction::None,
        _ => LoadRestriction::RootOnly,
    };

    let output = Builder::new()
        .with_restriction(restriction)
        .build(&dir)
        .with_context(|| format!("failed to build '{}'", dir.display()))?;
    for warning in &output.warnings {
        tracing::warn!(%warning, "unresolved reference");
    }
    let rendered = output.render()?;

    match args.get_one::<PathBuf>("output") {
        Some(path) => write_output(path, &rendered),
        None => {
            print!("{rendered}");
            Ok(())
        }
    }
}

fn write_output(path: &Path, rendered: &str) -> Result<()> {
    fs::write(path, rendered).with_context(|| format!("failed to write '{}'", path.display()))
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(&matches);

    let result = match matches.subcommand() {
        Some(("build", args)) => build(args),
        _ => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
