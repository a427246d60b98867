use std::fmt;
use std::net::IpAddr;

use camino::{Utf8Path, Utf8PathBuf};
use maxminddb::{geoip2, Reader};

use crate::error::{Error, Result};
use crate::geoip::Location;

/// Trait for services that map an address token to a location record.
///
/// `Ok(None)` means the service answered but holds no record for the token.
pub trait LocationLookup {
    fn lookup(&self, token: &str) -> Result<Option<Location>>;
}

impl<T: LocationLookup + ?Sized> LocationLookup for &T {
    #[inline]
    fn lookup(&self, token: &str) -> Result<Option<Location>> {
        (**self).lookup(token)
    }
}

/// Language used for place names read from the database.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    English,
    SimplifiedChinese,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "en"),
            Language::SimplifiedChinese => write!(f, "zh-CN"),
        }
    }
}

// Pick the configured translation out of a record's `names` block.
macro_rules! localized {
    ($names:expr, $language:expr) => {
        match $language {
            Language::English => $names.english,
            Language::SimplifiedChinese => $names.simplified_chinese,
        }
    };
}

/// Location lookups backed by a MaxMind-format City database.
///
/// The whole file is read into memory when opened and never written again.
pub struct MmdbLookup {
    path: Utf8PathBuf,
    reader: Reader<Vec<u8>>,
    language: Language,
}

impl fmt::Debug for MmdbLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmdbLookup")
            .field("path", &self.path)
            .field("language", &self.language)
            .field("database_type", &self.reader.metadata.database_type)
            .finish()
    }
}

impl MmdbLookup {
    /// Open and parse the database at `path`.
    pub fn open(path: &Utf8Path, language: Language) -> Result<Self> {
        let reader = Reader::open_readfile(path.as_std_path()).map_err(|source| Error::Database {
            path: path.to_owned(),
            source,
        })?;
        log::debug!(
            "loaded {} database from {} ({} nodes)",
            reader.metadata.database_type,
            path,
            reader.metadata.node_count
        );
        Ok(Self {
            path: path.to_owned(),
            reader,
            language,
        })
    }
}

impl LocationLookup for MmdbLookup {
    fn lookup(&self, token: &str) -> Result<Option<Location>> {
        let ip: IpAddr = token.parse().map_err(|_| Error::InvalidAddress {
            token: token.to_string(),
        })?;

        let found = self.reader.lookup(ip).map_err(|source| Error::Lookup {
            ip: token.to_string(),
            source,
        })?;
        if !found.has_data() {
            return Ok(None);
        }

        let record: Option<geoip2::City<'_>> = found.decode().map_err(|source| Error::Lookup {
            ip: token.to_string(),
            source,
        })?;

        Ok(record.map(|record| {
            let province = record
                .subdivisions
                .first()
                .and_then(|sub| localized!(sub.names, self.language));
            Location {
                country: localized!(record.country.names, self.language).map(str::to_string),
                province: province.map(str::to_string),
                city: localized!(record.city.names, self.language).map(str::to_string),
            }
        }))
    }
}
