//! Making sure a geo database is on disk before the first lookup.
//!
//! The database lives next to the running binary unless configured
//! otherwise. When it is missing it is downloaded once into a temporary file
//! in the same directory and renamed into place, so the final path only ever
//! holds a complete file.

use std::fs;
use std::io::{self, Read, Write};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;

use crate::error::{Error, Result};
use crate::mmdb::{Language, MmdbLookup};

/// File name of the installed database.
pub const DATABASE_FILENAME: &str = "GeoLite2-City.mmdb";

/// Where the database is fetched from when it is missing.
pub const DEFAULT_DATABASE_URL: &str =
    "https://github.com/P3TERX/GeoLite.mmdb/raw/download/GeoLite2-City.mmdb";

const TEMP_PREFIX: &str = "GeoLite2-City-";
const TEMP_SUFFIX: &str = ".mmdb.tmp";

// 32KB read buffer
const BUFFER_SIZE: usize = 32 * 1024;

// Plain-text progress is printed every tenth of the body, or every 4MiB when
// the length is unknown
const PROGRESS_STEPS: u64 = 10;
const UNKNOWN_LENGTH_STEP: u64 = 4 * 1024 * 1024;
const MIB: f64 = 1024.0 * 1024.0;

/// Where the database should be installed and where to get it from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseSource {
    pub path: Utf8PathBuf,
    pub url: String,
}

impl DatabaseSource {
    pub fn new<P: Into<Utf8PathBuf>, S: Into<String>>(path: P, url: S) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
        }
    }

    /// Install next to the running binary.
    pub fn beside_executable<S: Into<String>>(url: S) -> Result<Self> {
        Ok(Self::new(default_install_path()?, url))
    }

    /// The file name, for recovery instructions.
    pub fn file_name(&self) -> &str {
        self.path.file_name().unwrap_or(DATABASE_FILENAME)
    }

    /// The directory the database and its temporary download live in.
    pub fn directory(&self) -> &Utf8Path {
        match self.path.parent() {
            Some(dir) if !dir.as_str().is_empty() => dir,
            _ => Utf8Path::new("."),
        }
    }
}

/// `<directory of the current executable>/GeoLite2-City.mmdb`
pub fn default_install_path() -> Result<Utf8PathBuf> {
    let exe = std::env::current_exe().map_err(Error::ExecutablePath)?;
    let dir = exe.parent().ok_or_else(|| {
        Error::ExecutablePath(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} has no parent directory", exe.display()),
        ))
    })?;
    Utf8PathBuf::from_path_buf(dir.join(DATABASE_FILENAME))
        .map_err(|path| Error::NonUtf8Path { path })
}

/// What [`ensure`] had to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Provisioned {
    /// A file was already at the install path; nothing was fetched.
    AlreadyPresent,
    /// The database was downloaded and installed.
    Downloaded { bytes: u64 },
}

/// Guarantee that a database file exists at `source.path`.
///
/// Existence alone is enough; the file is not checked for integrity or age.
/// Otherwise a single download is attempted, without retries. On failure no
/// file is left at the install path and the temporary file is removed.
pub fn ensure(source: &DatabaseSource) -> Result<Provisioned> {
    if fs::metadata(&source.path).is_ok() {
        log::debug!("using existing database at {}", source.path);
        return Ok(Provisioned::AlreadyPresent);
    }

    log::info!(
        "database missing at {}, downloading from {}",
        source.path,
        source.url
    );
    let bytes = download(source)?;
    log::info!("installed {} bytes at {}", bytes, source.path);
    Ok(Provisioned::Downloaded { bytes })
}

/// Parse the database at `path` for lookups.
pub fn load(path: &Utf8Path, language: Language) -> Result<MmdbLookup> {
    MmdbLookup::open(path, language)
}

fn download(db: &DatabaseSource) -> Result<u64> {
    let url = db.url.as_str();
    let download_err = |source| Error::Download {
        url: url.to_string(),
        source,
    };

    // No overall timeout: the database is large and links can be slow
    let client = reqwest::blocking::Client::builder()
        .timeout(None::<Duration>)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(download_err)?;

    eprintln!("Downloading IP database...");
    let mut response = client.get(url).send().map_err(download_err)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
        });
    }

    let dir = db.directory();
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|source| Error::TempFile {
            dir: dir.to_owned(),
            source,
        })?;

    // From here on, returning early drops `tmp`, which deletes it
    let transfer_err = |source| Error::Transfer {
        path: db.path.clone(),
        source,
    };
    let mut progress = Progress::new(response.content_length());
    let copied = copy_with_progress(&mut response, tmp.as_file_mut(), |n| progress.update(n));
    progress.finish(copied.as_ref().ok().copied());
    let bytes = copied.map_err(transfer_err)?;
    tmp.as_file().sync_all().map_err(transfer_err)?;

    // rename, never copy: the install path only sees a finished file
    tmp.persist(&db.path).map_err(|err| Error::Persist {
        path: db.path.clone(),
        source: err.error,
    })?;

    eprintln!("Download complete!");
    Ok(bytes)
}

/// Download progress on stderr: a live bar on a terminal, periodic lines
/// when stderr is a file or pipe.
enum Progress {
    Bar(ProgressBar),
    Lines(LineProgress<io::Stderr>),
}

impl Progress {
    fn new(total: Option<u64>) -> Self {
        let bar = progress_bar(total);
        if bar.is_hidden() {
            Progress::Lines(LineProgress::new(io::stderr(), total))
        } else {
            Progress::Bar(bar)
        }
    }

    fn update(&mut self, copied: u64) {
        match self {
            Progress::Bar(bar) => bar.set_position(copied),
            Progress::Lines(lines) => lines.update(copied),
        }
    }

    /// `copied` is `None` when the transfer failed.
    fn finish(&mut self, copied: Option<u64>) {
        match self {
            Progress::Bar(bar) => bar.finish_and_clear(),
            Progress::Lines(lines) => {
                if let Some(copied) = copied {
                    lines.finish(copied);
                }
            }
        }
    }
}

/// Progress as whole lines of text, for output that is not a terminal.
///
/// A line is written each time the transfer crosses another tenth of the
/// expected length, and once more at the end if the last chunk fell between
/// steps. Write errors are ignored; progress is informational only.
pub struct LineProgress<W> {
    out: W,
    total: Option<u64>,
    step: u64,
    next: u64,
    reported: u64,
}

impl<W: Write> LineProgress<W> {
    pub fn new(out: W, total: Option<u64>) -> Self {
        let step = match total {
            Some(len) if len > 0 => (len / PROGRESS_STEPS).max(1),
            _ => UNKNOWN_LENGTH_STEP,
        };
        Self {
            out,
            total: total.filter(|&len| len > 0),
            step,
            next: step,
            reported: 0,
        }
    }

    pub fn update(&mut self, copied: u64) {
        if copied >= self.next {
            self.report(copied);
            self.next = (copied / self.step + 1) * self.step;
        }
    }

    pub fn finish(&mut self, copied: u64) {
        if copied != self.reported {
            self.report(copied);
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn report(&mut self, copied: u64) {
        let done = copied as f64 / MIB;
        let _ = match self.total {
            Some(total) => writeln!(
                self.out,
                "Downloading: {:.2} MB / {:.2} MB ({:.1}%)",
                done,
                total as f64 / MIB,
                copied as f64 * 100.0 / total as f64
            ),
            None => writeln!(self.out, "Downloading: {:.2} MB", done),
        };
        self.reported = copied;
    }
}

fn progress_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(len) if len > 0 => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template(
                    "Downloading: {bytes} / {total_bytes} ({percent}%) [{bar:30}] {bytes_per_sec}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
            );
            bar
        }
        _ => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} Downloading: {bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        }
    }
}

/// Copy `reader` into `writer` through a fixed buffer, reporting the running
/// total after every chunk. Stops at end of stream or at the first error.
pub fn copy_with_progress<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    mut on_progress: F,
) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
    F: FnMut(u64),
{
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut copied: u64 = 0;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        writer.write_all(&buf[..n])?;
        copied += n as u64;
        on_progress(copied);
    }
    writer.flush()?;
    Ok(copied)
}
