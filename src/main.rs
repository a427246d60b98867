use anyhow::{Context, Error, Result};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use env_logger::Env;
use std::ffi::OsString;
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use termcolor::{ColorChoice, StandardStream};

use ipenrich::exec::{self, ChildCommand};
use ipenrich::provision::{self, DatabaseSource};
use ipenrich::{Decoration, Enricher, Language};

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = None,
    after_help = "Example: ipenrich ss -nltp"
)]
struct Args {
    /// Geo database file. Defaults to GeoLite2-City.mmdb next to this binary;
    /// it is downloaded there on first run
    #[clap(
        long,
        value_name = "PATH",
        value_hint = clap::ValueHint::FilePath,
        env = "IPENRICH_DB"
    )]
    db: Option<Utf8PathBuf>,

    /// Where to download the database from when it is missing
    #[clap(
        long,
        value_name = "URL",
        env = "IPENRICH_DB_URL",
        default_value = provision::DEFAULT_DATABASE_URL
    )]
    db_url: String,

    /// Language of the place names in annotations
    #[clap(long, value_enum, env = "IPENRICH_LANG", default_value_t = ArgsLanguage::En)]
    lang: ArgsLanguage,

    /// Use markers to highlight the annotations
    #[clap(short = 'C', long, value_enum, default_value_t = ArgsColorChoice::Auto)]
    color: ArgsColorChoice,

    /// The command to run, followed by its arguments
    #[clap(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<OsString>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum ArgsColorChoice {
    Always,
    Never,
    Auto,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
enum ArgsLanguage {
    En,
    ZhCn,
}

impl From<ArgsLanguage> for Language {
    fn from(lang: ArgsLanguage) -> Self {
        match lang {
            ArgsLanguage::En => Language::English,
            ArgsLanguage::ZhCn => Language::SimplifiedChinese,
        }
    }
}

/// Print an error the same way for every fatal path.
fn report(err: &Error) {
    // Print detailed error information based on environment variables
    if std::env::var("RUST_BACKTRACE").is_ok_and(|v| v == "1")
        && std::env::var("RUST_LIB_BACKTRACE").map_or(true, |v| v == "1")
    {
        let _ = writeln!(&mut io::stderr(), "Error: {:?}", err);
    } else {
        let _ = writeln!(&mut io::stderr(), "Error: {:#}", err);
    }
}

fn main() -> ExitCode {
    // Use a separate run function to handle the actual work
    match run_main() {
        Ok(code) => code,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run_main() -> Result<ExitCode> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // --help and --version are not failures; everything else,
            // including a missing command, exits 1
            let code = if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = err.print();
            return Ok(code);
        }
    };

    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    // determine appropriate colormode. auto simply
    // tests if stdout is a tty (if so, then yes color)
    // or otherwise don't color if it's to a file or another pipe
    let colormode = match args.color {
        ArgsColorChoice::Auto => {
            if io::stdout().is_terminal() {
                ColorChoice::Always
            } else {
                ColorChoice::Never
            }
        }
        ArgsColorChoice::Always => ColorChoice::Always,
        ArgsColorChoice::Never => ColorChoice::Never,
    };
    let decoration = if colormode == ColorChoice::Always {
        Decoration::Color
    } else {
        Decoration::Plain
    };

    let command = ChildCommand::from_argv(args.command).context("no command given")?;

    let source = match args.db {
        Some(path) => DatabaseSource::new(path, args.db_url),
        None => DatabaseSource::beside_executable(args.db_url)
            .context("cannot determine where to install the IP database")?,
    };
    log::debug!("database path: {}", source.path);

    if let Err(err) = provision::ensure(&source) {
        report(&Error::new(err));
        eprintln!(
            "Please manually download database file {} to: {}",
            source.file_name(),
            source.directory()
        );
        eprintln!("Download URL: {}", source.url);
        return Ok(ExitCode::FAILURE);
    }

    let lookup = provision::load(&source.path, args.lang.into())?;
    let enricher = Enricher::new(lookup)?.decoration(decoration);

    let mut out = io::BufWriter::with_capacity(65536, StandardStream::stdout(colormode));
    let code = exec::run(&command, &enricher, &mut out)?;

    // Codes above 255 can only come from non-unix children
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
