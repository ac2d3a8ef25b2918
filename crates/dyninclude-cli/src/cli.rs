use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};
use dyninclude::{ResolveRequest, resolve_directive};

use crate::error::{CliError, ExitStatus};

const NAME: &str = "dyninclude";

pub fn run() -> ExitCode {
    init_tracing();
    match run_cli(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            err.print();
            err.exit_code()
        }
    }
}

/// Parses CLI arguments, resolves one dynamic-include directive against the
/// including file's directory, and prints the assembled blocks in reading
/// order. Advisory messages from discovery and ordering go to `tracing`.
pub fn run_cli<I, S>(args: I) -> Result<ExitCode, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let command = build_cli();
    let matches = command.try_get_matches_from(args)?;

    let Some(file) = matches.get_one::<String>("file").map(PathBuf::from) else {
        return Err(CliError::new("missing FILE argument", ExitStatus::Usage));
    };
    let Some(glob) = matches.get_one::<String>("glob").cloned() else {
        return Err(CliError::new("missing GLOB argument", ExitStatus::Usage));
    };

    let dir = match file.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let root = matches
        .get_one::<String>("root")
        .map(PathBuf::from)
        .unwrap_or_else(|| dir.clone());

    let attributes = collect_attributes(&matches)?;
    let lookup = |key: &str| attributes.get(key).cloned();

    let target = format!("dynamic:{glob}");
    let request = ResolveRequest {
        dir: &dir,
        root: &root,
        target: &target,
        glob: &glob,
        current_file: &file,
    };

    let mut logger = |message: String| tracing::warn!("{message}");
    let blocks = resolve_directive(&request, &lookup, &mut logger)?;

    // Blocks arrive in reverse reading order (the library's contract with
    // stack-based hosts); print them the way a reader consumes them.
    for block in blocks.iter().rev() {
        print!("{}", block.content);
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn build_cli() -> Command {
    Command::new(NAME)
        .about("Resolve a dynamic-include directive over a documentation tree")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .required(true)
                .help("The including document. Its directory is the resolution directory."),
        )
        .arg(
            Arg::new("glob")
                .value_name("GLOB")
                .required(true)
                .help("Shell glob selecting the content files, relative to the resolution directory."),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("PATH")
                .help("Base directory for {root}-prefixed reference targets. Defaults to the resolution directory."),
        )
        .arg(
            Arg::new("order")
                .long("order")
                .value_name("LIST")
                .help("Colon-separated keys resolved files are ordered by."),
        )
        .arg(
            Arg::new("scopes")
                .long("scopes")
                .value_name("LIST")
                .help("Colon-separated accepted first-level directory names."),
        )
        .arg(
            Arg::new("areas")
                .long("areas")
                .value_name("LIST")
                .help("Colon-separated accepted second-level directory names."),
        )
        .arg(
            Arg::new("suffixes")
                .long("suffixes")
                .value_name("LIST")
                .help("Colon-separated qualifier suffixes to include, in priority order."),
        )
        .arg(
            Arg::new("level-offset-shifting")
                .long("level-offset-shifting")
                .value_name("N")
                .help("Signed shift applied when computing per-file level offsets (default 1)."),
        )
        .arg(
            Arg::new("logfile")
                .long("logfile")
                .value_name("PATH")
                .help("Append an audit log of the resolution to this file."),
        )
        .arg(
            Arg::new("external-xref-as-text")
                .long("external-xref-as-text")
                .action(ArgAction::SetTrue)
                .help("Degrade references to files outside the resolved set to their display text."),
        )
        .arg(
            Arg::new("display-view-source")
                .long("display-view-source")
                .action(ArgAction::SetTrue)
                .help("Emit a view-source link block ahead of each file."),
        )
        .arg(
            Arg::new("view-source-link-pattern")
                .long("view-source-link-pattern")
                .value_name("TEMPLATE")
                .help("Link target template; {name} placeholders are resolved per file."),
        )
        .arg(
            Arg::new("view-source-link-text")
                .long("view-source-link-text")
                .value_name("TEMPLATE")
                .help("Link text template for the view-source block."),
        )
        .arg(
            Arg::new("attr")
                .long("attr")
                .value_name("KEY=VALUE")
                .action(ArgAction::Append)
                .help("Additional document attribute, e.g. idprefix or gradle-rootdir."),
        )
}

/// Builds the attribute source the library reads its options from: every
/// directive option under its attribute key, plus free-form `--attr` pairs.
fn collect_attributes(matches: &ArgMatches) -> Result<BTreeMap<String, String>, CliError> {
    let mut attributes = BTreeMap::new();

    for key in [
        "order",
        "scopes",
        "areas",
        "suffixes",
        "level-offset-shifting",
        "logfile",
        "view-source-link-pattern",
        "view-source-link-text",
    ] {
        if let Some(value) = matches.get_one::<String>(key) {
            attributes.insert(key.to_string(), value.clone());
        }
    }
    for key in ["external-xref-as-text", "display-view-source"] {
        if matches.get_flag(key) {
            attributes.insert(key.to_string(), String::new());
        }
    }

    if let Some(pairs) = matches.get_many::<String>("attr") {
        for pair in pairs {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(CliError::new(
                    format!("invalid --attr '{pair}', expected KEY=VALUE"),
                    ExitStatus::Usage,
                ));
            };
            attributes.insert(key.to_string(), value.to_string());
        }
    }

    Ok(attributes)
}
