use camino::Utf8PathBuf;

/// Error types for the ipenrich library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The running executable's own path could not be determined.
    #[error("failed to get executable path")]
    ExecutablePath(#[source] std::io::Error),

    /// The executable's path is not valid UTF-8.
    #[error("executable path is not valid UTF-8: {path}")]
    NonUtf8Path { path: std::path::PathBuf },

    /// The database download request failed at the transport level.
    #[error("failed to download IP database from {url}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The database server answered with something other than 200.
    #[error("failed to download IP database: HTTP {status}")]
    HttpStatus { status: u16 },

    /// Reading the response body or writing the temporary file failed.
    #[error("failed to transfer IP database into {path}")]
    Transfer {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary download file could not be created.
    #[error("failed to create temp file in {dir}")]
    TempFile {
        dir: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The finished download could not be renamed into place.
    #[error("failed to move database file to {path}")]
    Persist {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The database file exists but could not be opened or parsed.
    #[error("failed to load IP database from {path}")]
    Database {
        path: Utf8PathBuf,
        #[source]
        source: maxminddb::MaxMindDbError,
    },

    /// A token could not be parsed as an IP address.
    #[error("invalid IP address: {token}")]
    InvalidAddress { token: String },

    /// IP address lookup failed in the MMDB database.
    #[error("lookup failed for {ip}")]
    Lookup {
        ip: String,
        #[source]
        source: maxminddb::MaxMindDbError,
    },

    /// The wrapped command could not be started.
    #[error("failed to start command: {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// No IP address patterns were selected for extraction.
    #[error("no IP patterns selected")]
    NoPatterns,

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A regex compilation error.
    #[error("regex error: {0}")]
    Regex(#[from] regex_automata::meta::BuildError),

    /// A pattern failed to parse.
    #[error("regex syntax error: {0}")]
    Syntax(#[from] regex_syntax::Error),
}

/// Convenience type alias for Results using the library error.
pub type Result<T> = std::result::Result<T, Error>;
