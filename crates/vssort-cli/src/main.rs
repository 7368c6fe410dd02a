use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use vssort::{DeclarationPolicy, FormatConfig, Indent, Options, SortRule, SortRules};

const SETTINGS_EXTENSION: &str = ".vssettings";

#[derive(Debug, Parser)]
#[command(
    name = "vssort",
    version,
    about = "Sort Visual Studio settings file by PropertyValue, ToolsOptionsCategory, ToolsOptionsSubCategory, and Category name attributes"
)]
struct Args {
    /// Path to the input .vssettings file
    #[arg(value_name = "INPUT_FILE")]
    input_file: String,
    /// Path to the output file (must not end in .vssettings)
    #[arg(short, long, value_name = "OUTPUT")]
    output: String,
    /// Extra sort rule, e.g. `Item=name,id` (repeatable)
    #[arg(long = "rule", value_name = "TAG=ATTR[,ATTR...]")]
    rules: Vec<SortRule>,
    /// Indentation per level: `tab` or a number of spaces
    #[arg(long, default_value_t = Indent::Tab)]
    indent: Indent,
    /// What to do with the <?xml ...?> declaration
    #[arg(long, value_enum, default_value_t = DeclarationArg::Preserve)]
    declaration: DeclarationArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DeclarationArg {
    Preserve,
    Always,
    Omit,
}

impl From<DeclarationArg> for DeclarationPolicy {
    fn from(value: DeclarationArg) -> Self {
        match value {
            DeclarationArg::Preserve => Self::Preserve,
            DeclarationArg::Always => Self::Always,
            DeclarationArg::Omit => Self::Omit,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(Args::parse()) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let input = resolve_input(&args.input_file)?;
    let output = resolve_output(&args.output, &input)?;
    debug!(input = %input.display(), output = %output.display(), "resolved paths");

    let options = Options {
        rules: args.rules.into_iter().fold(SortRules::default(), SortRules::with_rule),
        format: FormatConfig {
            indent: args.indent,
            declaration: args.declaration.into(),
            ..FormatConfig::default()
        },
        ..Options::default()
    };

    let bytes = std::fs::read(&input)
        .with_context(|| format!("failed to read input file {}", input.display()))?;
    let sorted = vssort::normalize(&bytes, &options)
        .with_context(|| format!("failed to process {}", input.display()))?;
    std::fs::write(&output, sorted)
        .with_context(|| format!("failed to write output file {}", output.display()))?;

    info!("Sorted settings written to: {}", output.display());
    Ok(())
}

fn resolve_input(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("input file must be specified");
    }
    if !raw.ends_with(SETTINGS_EXTENSION) {
        bail!("input file must be a {SETTINGS_EXTENSION} file");
    }

    let path = expand_home(raw)?;
    if !path.is_file() {
        bail!("input file '{}' does not exist", path.display());
    }
    Ok(path)
}

/// An output without a directory component lands next to the input file.
fn resolve_output(raw: &str, input: &Path) -> Result<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("output file must be specified");
    }

    let path = expand_home(raw)?;
    let Some(file_name) = path.file_name() else {
        bail!("output '{}' does not name a file", path.display());
    };

    let dir = match path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => {
            if !dir.is_dir() {
                bail!("output directory '{}' does not exist", dir.display());
            }
            dir
        }
        None => input.parent().unwrap_or_else(|| Path::new("")),
    };

    if file_name.to_string_lossy().ends_with(SETTINGS_EXTENSION) {
        bail!("output file should not have a {SETTINGS_EXTENSION} extension");
    }
    Ok(dir.join(file_name))
}

fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
            let home = dirs::home_dir().context("could not determine home directory")?;
            Ok(home.join(rest.trim_start_matches(['/', '\\'])))
        }
        _ => Ok(PathBuf::from(path)),
    }
}
