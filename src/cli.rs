use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::batch::BatchRequest;

const EXTRACTED_INSTALLER_FLAG: &str = "--extracted-installer";
const CONFIG_FLAG: &str = "--config";

/// driver-slimmer - strip unwanted parts from an extracted driver installer
///
/// With no arguments the interactive mode starts. Batch mode needs both
/// options; any other argument is ignored.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "driver-slimmer")]
#[command(about = "Keep only the packages, scheduled tasks and display components listed in a selection file")]
#[command(version)]
pub struct Cli {
    /// Directory holding the extracted driver installer
    #[arg(long, value_name = "DIR")]
    pub extracted_installer: Option<PathBuf>,

    /// Selection file naming what to keep
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// How the process was asked to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    Batch(BatchRequest),
}

impl Cli {
    /// Decide the run mode from the process arguments
    pub fn mode_from_env() -> Mode {
        Self::mode_from_args(std::env::args_os().skip(1))
    }

    /// Decide the run mode from arguments (program name excluded)
    pub fn mode_from_args<I, S>(args: I) -> Mode
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            Mode::Interactive
        } else {
            Mode::Batch(Self::scan(&args).into_request())
        }
    }

    /// Lenient scan for the two batch options.
    ///
    /// Flags match ASCII case-insensitively anywhere in the list and take the
    /// next token as their value, whatever it looks like. A flag in last
    /// position has no value and is ignored. Later occurrences win. Nothing
    /// else is inspected, so unknown arguments never cause an error.
    ///
    /// clap's parser is not used here: it rejects unknown arguments, matches
    /// long flags case-sensitively and refuses a flag-like value. The derive
    /// only supplies the help text.
    pub fn scan(args: &[OsString]) -> Self {
        let mut cli = Cli::default();

        for (i, arg) in args.iter().enumerate() {
            let Some(value) = args.get(i + 1) else {
                break;
            };
            let Some(flag) = arg.to_str() else {
                continue;
            };

            if flag.eq_ignore_ascii_case(EXTRACTED_INSTALLER_FLAG) {
                cli.extracted_installer = Some(PathBuf::from(value));
            }
            if flag.eq_ignore_ascii_case(CONFIG_FLAG) {
                cli.config = Some(PathBuf::from(value));
            }
        }

        cli
    }

    pub fn into_request(self) -> BatchRequest {
        BatchRequest {
            extracted_installer: self.extracted_installer,
            config: self.config,
        }
    }

    /// Rendered help text
    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }
}
