use clap::{ArgAction, Parser};

use crate::params::Settings;

#[cfg(not(feature = "version-from-env"))]
const VERSION: &str = git_version::git_version!(
    args = ["--tags", "--always", "--dirty=+"],
    fallback = env!("CARGO_PKG_VERSION")
);
#[cfg(feature = "version-from-env")]
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(
    name="iplogtally",
    version=VERSION,
    about="Count access log hits per IP within a time window and subnet",
    disable_help_flag=true,     // positioned manually below
    disable_version_flag=true,  // we position it manually
    before_help="",
    after_help="\
Commands are read one per line, from stdin or from --script:

  --file-log <log_file_path> --file-output <output_file_path>
  --address-start <start_ip> --address-mask <mask>
  --time-start <dd.MM.yyyy> --time-end <dd.MM.yyyy>

Each command appends '<address>: <count>' lines to the output file.
Type 'exit' to stop.

Log lines look like:
  192.168.1.5 2023-01-10 08:00:00

Example invocations:
  # Interactive session, with per-command summaries on stderr.
  iplogtally -v

  # Run a prepared batch of commands without prompts.
  iplogtally -q -s commands.txt",
    help_template="\
{name} {version} - {about}

{usage-heading} {usage}{before-help}{all-args}{after-help}"
)]
pub struct Args {
    /// Read commands from FILE instead of stdin ('-' is stdin)
    #[arg(
        short = 's',
        long = "script",
        value_name = "FILE",
        help_heading = "Input Control"
    )]
    pub script: Option<String>,

    /// Do not print the prompt before reading each command
    #[arg(short = 'q', long = "quiet", help_heading = "Output Control")]
    pub quiet: bool,

    /// Log more to stderr (may repeat: info, debug, trace)
    #[arg(
        short = 'v', long = "verbose", action = ArgAction::Count,
        help_heading = "Output Control"
    )]
    pub verbose: u8,

    /// Show help
    #[arg(
        short = 'h', long = "help", action = ArgAction::Help,
        help_heading = "Generic Program Information"
    )]
    pub help: Option<bool>,

    /// Show program version
    #[arg(short = 'V', long="version", action = ArgAction::Version,
        help_heading="Generic Program Information",
    )]
    pub version: Option<bool>,
}

impl Args {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Convert CLI args to process settings
    pub fn into_settings(self) -> Settings {
        Settings {
            script: self.script,
            quiet: self.quiet,
            verbosity: self.verbose,
        }
    }
}
