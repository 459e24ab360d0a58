//! Command-line arguments.

use std::path::PathBuf;

use crate::error::CliError;

/// Help text printed by `--help`.
pub const HELP: &str = r"Daedalus - build-time request delegate generator

USAGE:
    daedalus [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Configuration file (TOML or JSON); defaults to <ROOT>/daedalus.toml
    -r, --root <DIR>       Crate root to scan (default: .)
    -o, --out <FILE>       Generated file (default: <ROOT>/<generator.output_file>)
        --check            Fail if the generated file is missing or out of date
        --watch            Regenerate whenever a source file changes
        --json             Print diagnostics as JSON lines on standard output
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    DAEDALUS__GENERATOR__SOURCE_ROOT    Directory scanned for endpoint registrations
    DAEDALUS__DIAGNOSTICS__SUPPRESS     Comma separated diagnostic ids to drop
    DAEDALUS__LOGGING__LEVEL            Log level or filter directive
    RUST_LOG                            Overrides the configured log filter

EXAMPLES:
    # Regenerate once
    daedalus --root crates/api

    # Verify in CI that the checked-in file is current
    daedalus --check --out src/daedalus_endpoints.rs
";

/// Options for a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// Explicit configuration file.
    pub config: Option<PathBuf>,
    /// Crate root.
    pub root: PathBuf,
    /// Explicit output file.
    pub out: Option<PathBuf>,
    /// Compare instead of writing.
    pub check: bool,
    /// Keep running and regenerate on change.
    pub watch: bool,
    /// JSON diagnostics.
    pub json: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: None,
            root: PathBuf::from("."),
            out: None,
            check: false,
            watch: false,
            json: false,
        }
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate with these options.
    Run(Args),
    /// Print help.
    Help,
    /// Print the version.
    Version,
}

impl Args {
    /// Parses the process arguments.
    pub fn parse() -> Result<Command, CliError> {
        Self::parse_from(std::env::args().skip(1))
    }

    /// Parses `args`, which must not include the program name.
    pub fn parse_from<I>(args: I) -> Result<Command, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => parsed.config = Some(value(&mut args, "--config")?.into()),
                "--root" | "-r" => parsed.root = value(&mut args, "--root")?.into(),
                "--out" | "-o" => parsed.out = Some(value(&mut args, "--out")?.into()),
                "--check" => parsed.check = true,
                "--watch" => parsed.watch = true,
                "--json" => parsed.json = true,
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                other => return Err(CliError::UnknownArgument(other.to_string())),
            }
        }

        if parsed.check && parsed.watch {
            return Err(CliError::ConflictingFlags {
                first: "--check",
                second: "--watch",
            });
        }
        Ok(Command::Run(parsed))
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<String, CliError> {
    args.next().ok_or(CliError::MissingValue { flag })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, CliError> {
        Args::parse_from(args.iter().map(ToString::to_string))
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse(&[]).unwrap(), Command::Run(Args::default()));
    }

    #[test]
    fn test_all_options() {
        let command = parse(&["-c", "gen.toml", "--root", "api", "-o", "out.rs", "--check", "--json"]).unwrap();
        assert_eq!(
            command,
            Command::Run(Args {
                config: Some(PathBuf::from("gen.toml")),
                root: PathBuf::from("api"),
                out: Some(PathBuf::from("out.rs")),
                check: true,
                watch: false,
                json: true,
            })
        );
    }

    #[test]
    fn test_help_and_version_win() {
        assert_eq!(parse(&["--root", "x", "-h"]).unwrap(), Command::Help);
        assert_eq!(parse(&["-V"]).unwrap(), Command::Version);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse(&["--bogus"]), Err(CliError::UnknownArgument(a)) if a == "--bogus"));
        assert!(matches!(parse(&["--out"]), Err(CliError::MissingValue { flag: "--out" })));
        assert!(matches!(
            parse(&["--check", "--watch"]),
            Err(CliError::ConflictingFlags { .. })
        ));
    }
}
