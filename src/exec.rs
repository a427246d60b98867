//! Running the wrapped command and enriching what it prints.

use std::ffi::{OsStr, OsString};
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Command, ExitStatus, Stdio};

use crate::classify::Classify;
use crate::enrich::Enricher;
use crate::error::{Error, Result};
use crate::input::LineReader;
use crate::mmdb::LocationLookup;

/// The command line to run: a program and its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl ChildCommand {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split `argv`-style words into program and arguments. `None` if empty.
    pub fn from_argv<I: IntoIterator<Item = OsString>>(argv: I) -> Option<Self> {
        let mut words = argv.into_iter();
        let program = words.next()?;
        Some(Self::new(program, words))
    }

    #[inline]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    #[inline]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

/// Run `cmd`, writing each enriched stdout line to `out`, and return the exit
/// code this process should finish with.
///
/// The child's stderr is inherited untouched. Failing to start the child is
/// an error; everything after that (unreadable output, a closed `out`) is
/// reported and the child is still waited for.
pub fn run<L, C, W>(cmd: &ChildCommand, enricher: &Enricher<L, C>, out: &mut W) -> Result<i32>
where
    L: LocationLookup,
    C: Classify,
    W: Write + ?Sized,
{
    let mut child = Command::new(&cmd.program)
        .args(&cmd.args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| Error::Spawn {
            program: cmd.program.to_string_lossy().into_owned(),
            source,
        })?;
    log::debug!("started {:?} as pid {}", cmd.program, child.id());

    if let Some(stdout) = child.stdout.take() {
        // `forward` consumes the pipe, so our end is closed before waiting
        // and a child still writing is not left blocked
        match forward(BufReader::new(stdout), enricher, out) {
            Forwarded::Finished => {}
            Forwarded::ReadFailed(err) => eprintln!("Error reading command output: {}", err),
            Forwarded::WriteFailed(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                log::debug!("output closed, no longer reading from child");
            }
            Forwarded::WriteFailed(err) => eprintln!("Error writing output: {}", err),
        }
    }

    let status = child.wait()?;
    log::debug!("child finished with {}", status);
    Ok(exit_code(status))
}

/// How forwarding a child's output ended.
#[derive(Debug)]
pub enum Forwarded {
    /// The child closed its output.
    Finished,
    /// Reading the child's output failed. Lines before the failure were
    /// written.
    ReadFailed(io::Error),
    /// Writing to `out` failed; nothing more was read.
    WriteFailed(io::Error),
}

/// Enrich every line of `reader` into `out`, one flushed line at a time.
pub fn forward<R, L, C, W>(reader: R, enricher: &Enricher<L, C>, out: &mut W) -> Forwarded
where
    R: BufRead,
    L: LocationLookup,
    C: Classify,
    W: Write + ?Sized,
{
    let mut reader = LineReader::new(reader);
    let mut write_error = None;

    let read_result = reader.for_byte_line(|line| {
        let enriched = enricher.enrich_line(line.content());
        match write_line(out, &enriched) {
            Ok(()) => Ok(true),
            Err(err) => {
                write_error = Some(err);
                Ok(false)
            }
        }
    });

    match (write_error, read_result) {
        (Some(err), _) => Forwarded::WriteFailed(err),
        (None, Err(err)) => Forwarded::ReadFailed(err),
        (None, Ok(())) => Forwarded::Finished,
    }
}

#[inline]
fn write_line<W: Write + ?Sized>(out: &mut W, line: &[u8]) -> io::Result<()> {
    out.write_all(line)?;
    out.write_all(b"\n")?;
    out.flush()
}

/// The code to exit with for a finished child: its own exit code, or
/// `128 + signal` when a signal ended it.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
