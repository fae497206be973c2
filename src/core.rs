use std::fs::File;
use std::io::{self, BufRead, BufReader, LineWriter, Write};
use std::process::ExitCode;

use tracing::{info, warn};

use crate::command::{
    COMMAND_TOKENS, USAGE, ValidationError, parse_tokens, unknown_flags,
};
use crate::files::{LogLines, LogSourceError, OutputSinkError, append_to};
use crate::filter::filter;
use crate::output::Report;
use crate::params::{AddressRange, Parameters, Settings};
use crate::tally::try_tally;

const PROMPT: &str = "Waiting command...";
const EXITING: &str = "Exiting...";
const COMPLETED: &str = "Analysis completed successfully.";

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    LogSource(#[from] LogSourceError),
    #[error(transparent)]
    OutputSink(#[from] OutputSinkError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// What one successful command did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub lines: usize,
    pub skipped: usize,
    pub matched: u64,
    pub addresses: usize,
}

/// Run the read-filter-tally-append pipeline for one command. The log is
/// read completely before the output file is opened, so a log that
/// cannot be read leaves the output untouched.
pub fn execute(params: &Parameters) -> Result<Summary, CommandError> {
    let window = params.window();
    let range = params.range();
    info!(log = %params.log_file.display(), %window, %range, "analysing");
    if let AddressRange::Within(subnet) = range
        && subnet.has_host_bits()
    {
        info!(%subnet, "host bits of --address-start are ignored");
    }

    let lines = LogLines::open(&params.log_file)?;
    let mut filtered = filter(lines, window, range);
    let table = try_tally(filtered.by_ref())?;
    let skipped = filtered.skipped();
    let lines = filtered.into_inner().lineno();

    append_to(&params.output_file, |w| Report::new(&table).print_counts(w))?;

    Ok(Summary {
        lines,
        skipped,
        matched: table.total(),
        addresses: table.len(),
    })
}

/// Handle one line of input. Returns whether the caller should keep
/// reading. Command failures are reported to `out` and never stop the
/// loop; only a failing `out` does.
pub fn dispatch(line: &str, out: &mut dyn Write) -> io::Result<Control> {
    // Only a truly empty line is skipped; whitespace alone is malformed.
    if line.trim_end_matches(['\r', '\n']).is_empty() {
        return Ok(Control::Continue);
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"exit") => {
            writeln!(out, "{EXITING}")?;
            return Ok(Control::Exit);
        }
        _ => {}
    }

    if tokens.len() != COMMAND_TOKENS {
        writeln!(out, "{USAGE}")?;
        return Ok(Control::Continue);
    }

    for flag in unknown_flags(&tokens) {
        writeln!(out, "Unknown argument: {flag}")?;
    }

    let result = parse_tokens(&tokens)
        .map_err(CommandError::from)
        .and_then(|params| execute(&params));
    match result {
        Ok(summary) => {
            info!(
                lines = summary.lines,
                skipped = summary.skipped,
                matched = summary.matched,
                addresses = summary.addresses,
                "command done"
            );
            writeln!(out, "{COMPLETED}")?;
        }
        Err(e) => {
            warn!(error = %e, "command failed");
            writeln!(out, "{e}")?;
        }
    }
    Ok(Control::Continue)
}

/// Feed every line of `reader` to [`dispatch`] until `exit` or end of
/// input.
pub fn serve<R: BufRead>(
    mut reader: R,
    out: &mut dyn Write,
    prompt: bool,
) -> io::Result<()> {
    let mut line = Vec::new();
    loop {
        if prompt {
            writeln!(out, "{PROMPT}")?;
            out.flush()?;
        }

        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        // Paths may be anything; a mangled byte will fail the command
        // with a readable error instead of killing the loop.
        let text = String::from_utf8_lossy(&line);
        if dispatch(&text, out)? == Control::Exit {
            break;
        }
    }
    out.flush()
}

/// Entry point for the application, called from main().
pub fn run(settings: &Settings) -> Result<ExitCode, String> {
    let reader: Box<dyn BufRead> = match settings.script.as_deref() {
        None | Some("-") => Box::new(io::stdin().lock()),
        Some(path) => match File::open(path) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => return Err(format!("{path}: {e}")),
        },
    };

    let stdout = io::stdout();
    let mut writer = LineWriter::new(stdout.lock());

    serve(reader, &mut writer, !settings.quiet).map_err(|e| e.to_string())?;

    Ok(ExitCode::SUCCESS)
}
