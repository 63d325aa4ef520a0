//! Log setup: timestamped lines to stdout and to an append-only log file

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Target, WriteStyle};
use log::LevelFilter;

/// Writes everything to two sinks. A failing sink does not keep the other
/// from receiving the data; the first error is reported afterwards.
pub struct TeeWriter<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> TeeWriter<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Write, B: Write> Write for TeeWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let first = self.first.write_all(buf);
        let second = self.second.write_all(buf);
        first.and(second)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let first = self.first.flush();
        let second = self.second.flush();
        first.and(second)
    }
}

/// Open `path` for appending, creating it and its parent directories
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global logger. `RUST_LOG` overrides the default filter.
pub fn init(log_file: &Path, verbose: bool) -> io::Result<()> {
    let file = open_log_file(log_file)?;
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("tiles_dl", level)
        .parse_default_env()
        .format_timestamp_millis()
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(TeeWriter::new(io::stdout(), file))))
        .try_init()
        .map_err(io::Error::other)
}
