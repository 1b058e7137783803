use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mismo::convert::document_to_value;
use mismo::{extract, json, ConvertOptions, Value, XmlConfig, XmlParser};

#[derive(Debug, Parser)]
#[command(
    name = "mismo2json",
    version,
    about = "Parse MISMO XML files to JSON format",
    after_help = "Examples:\n  \
        mismo2json input.xml                      # Creates input.json\n  \
        mismo2json input.xml -o output.json       # Custom output file\n  \
        mismo2json input.xml --structured         # Also create input_structured.json\n  \
        mismo2json input.xml -s -o result.json    # Creates result.json and result_structured.json"
)]
struct Args {
    /// Input XML file
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// Output JSON file (defaults to the input path with a .json extension)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Also write a structured version with extracted loan data
    #[arg(short, long)]
    structured: bool,
    /// Path for the structured output (defaults to <OUTPUT stem>_structured.json)
    #[arg(long, value_name = "PATH")]
    structured_output: Option<PathBuf>,
    /// Write compact JSON instead of indented
    #[arg(long)]
    compact: bool,
    /// Keep the root element name as the top-level key
    #[arg(long)]
    keep_root: bool,
    /// Maximum element nesting depth (0 means unlimited)
    #[arg(long, value_name = "N", default_value_t = 0)]
    max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    #[arg(long, value_name = "BYTES", default_value_t = 0)]
    max_size: usize,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("input file '{}' not found", .0.display())]
    FileNotFound(PathBuf),
    #[error("failed to read input file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid XML in '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: mismo::Error,
    },
    #[error("'{}' exceeds a configured limit: {source}", .path.display())]
    Limit {
        path: PathBuf,
        #[source]
        source: mismo::Error,
    },
    #[error("failed to write output file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CliError {
    /// Process exit code; 2 is left to clap for usage errors
    fn exit_code(&self) -> u8 {
        match self {
            Self::FileNotFound(_) => 1,
            Self::Parse { .. } => 3,
            Self::Write { .. } => 4,
            Self::Read { .. } => 5,
            Self::Limit { .. } => 6,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let input = read_input(&args.input)?;

    let options = ConvertOptions {
        xml: XmlConfig::new(args.max_depth, args.max_size),
        keep_root: args.keep_root,
    };
    let doc = XmlParser::with_config(&input, options.xml)
        .parse()
        .map_err(|source| {
            let path = args.input.clone();
            if source.kind().is_limit() {
                CliError::Limit { path, source }
            } else {
                CliError::Parse { path, source }
            }
        })?;
    let tree = document_to_value(&doc, &options);

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    write_json(&output_path, &tree, args.compact)?;
    info!(
        "Successfully converted {} to {}",
        args.input.display(),
        output_path.display()
    );

    let structured_path = match (&args.structured_output, args.structured) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(default_structured_path(&output_path)),
        (None, false) => None,
    };

    if let Some(path) = structured_path {
        let source = if args.keep_root {
            tree.get(doc.root.local_name()).unwrap_or(&tree)
        } else {
            &tree
        };
        let structured = extract(source);
        if structured.is_empty() {
            info!("No MISMO loan sections found; structured output will be empty");
        }
        write_json(&path, &structured.into_value(), args.compact)?;
        info!("Also created structured version: {}", path.display());
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => CliError::FileNotFound(path.to_path_buf()),
        _ => CliError::Read {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn write_json(path: &Path, value: &Value, compact: bool) -> Result<(), CliError> {
    let mut rendered = if compact {
        json::to_string(value)
    } else {
        json::to_string_pretty(value)
    };
    rendered.push('\n');

    std::fs::write(path, rendered).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// `loan.xml` -> `loan.json`; an input already named `.json` gets `.json.json`
fn default_output_path(input: &Path) -> PathBuf {
    let output = input.with_extension("json");
    if output == input {
        let mut name = input.as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    } else {
        output
    }
}

/// `result.json` -> `result_structured.json`, in the same directory
fn default_structured_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{stem}_structured.json"))
}
