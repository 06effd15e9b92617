// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result},
    exit_codes::TreeReporterExitCode,
    output::{OutputContext, OutputOpts},
};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
};
use tracing::{debug, error, info};
use tree_reporter::{
    config::{ReporterConfig, ReporterSettings},
    errors::DisplayErrorChain,
    reporter::Reporter,
    sink::WriterSink,
};

/// Turns a test engine's JSON event stream into service messages for IDE test consoles.
///
/// The engine writes one JSON event per line. Each event is translated as it arrives, so the
/// console shows results while the run is still in progress.
#[derive(Debug, Parser)]
#[command(
    version,
    name = "tree-reporter",
    styles = crate::output::clap_styles::style(),
    max_term_width = 100
)]
pub struct TreeReporterApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(subcommand)]
    command: Command,
}

impl TreeReporterApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the exit code.
    pub fn exec(self, output: OutputContext) -> Result<i32> {
        match self.command {
            Command::Report(opts) => opts.exec(output),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read an engine event stream and write service messages to stdout
    ///
    /// Blank lines are ignored. A line that fails to decode, or an event that cannot be applied,
    /// is logged to stderr and reporting continues with the next line.
    Report(ReportOpts),
}

#[derive(Debug, Args)]
struct ReportOpts {
    /// File to read events from, or `-` for stdin
    #[arg(long, short, value_name = "PATH", default_value = "-")]
    input: Utf8PathBuf,

    /// Config file [default: .config/tree-reporter.toml]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Do not send locationHint attributes
    #[arg(long)]
    no_location_hints: bool,

    /// Register each test when it starts rather than when the run starts
    #[arg(long)]
    lazy_registration: bool,
}

impl ReportOpts {
    fn exec(self, _output: OutputContext) -> Result<i32> {
        let current_dir = current_dir()?;
        let config = ReporterConfig::from_sources(&current_dir, self.config_file.as_deref())?;
        let settings = self.apply_overrides(config.reporter);
        debug!("reporter settings: {settings:?}");

        let stdout = std::io::stdout();
        let output = BufWriter::new(stdout.lock());
        if self.input.as_str() == "-" {
            run_report(settings, std::io::stdin().lock(), output)
        } else {
            let file = File::open(&self.input)
                .map_err(|err| ExpectedError::input_open_failed(&self.input, err))?;
            run_report(settings, BufReader::new(file), output)
        }
    }

    fn apply_overrides(&self, mut settings: ReporterSettings) -> ReporterSettings {
        if self.no_location_hints {
            settings.location_hints = false;
        }
        if self.lazy_registration {
            settings.register_upfront = false;
        }
        settings
    }
}

/// Returns the current directory, where the config file is looked up.
fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().map_err(|err| ExpectedError::GetCurrentDirFailed { err })?;
    Utf8PathBuf::try_from(cwd).map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { err })
}

/// Reports every line of `input` to `output`, returning the exit code.
///
/// Any run still in progress when `input` ends or fails is finished, so that the consumer never
/// sees a node without a terminal message.
pub(crate) fn run_report<R: BufRead, W: Write>(
    settings: ReporterSettings,
    input: R,
    output: W,
) -> Result<i32> {
    let mut reporter = Reporter::new(WriterSink::new(output), settings);

    let mut read_result = Ok(());
    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        match line {
            Ok(line) => reporter.report_line(line_number, &line),
            Err(err) => {
                read_result = Err(ExpectedError::InputReadFailed {
                    line: line_number,
                    err,
                });
                break;
            }
        }
    }

    if reporter.is_running() {
        info!("input ended before the run finished, finishing remaining tests");
    }
    let mut error_count = reporter.error_count();
    if let Err(error) = reporter.finish_run() {
        error!("{}", DisplayErrorChain::new(&error));
        error_count += 1;
    }

    let mut output = reporter.into_sink().into_inner();
    output
        .flush()
        .map_err(|err| ExpectedError::WriteOutputFailed { err })?;
    read_result?;

    if error_count > 0 {
        debug!("{error_count} events could not be reported");
        Ok(TreeReporterExitCode::EVENT_ERRORS)
    } else {
        Ok(TreeReporterExitCode::OK)
    }
}
