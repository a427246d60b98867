//! The ipenrich library: run a command and annotate the IP addresses it
//! prints with where they are.
//!
//! Each line is scanned for IPv4 tokens and bracketed IPv6 tokens, every
//! token is classified (loopback, private and link-local addresses are
//! `Local`), the rest are resolved against a geo database, and a
//! `(<label>)` annotation is inserted right after each token.
//!
//! # Examples
//!
//! Enriching a line with a custom lookup service:
//!
//! ```rust
//! use ipenrich::{Enricher, Location, LocationLookup};
//!
//! struct Everywhere;
//!
//! impl LocationLookup for Everywhere {
//!     fn lookup(&self, _token: &str) -> ipenrich::error::Result<Option<Location>> {
//!         Ok(Some(Location::new("Australia", "Queensland", "Brisbane")))
//!     }
//! }
//!
//! let enricher = Enricher::new(Everywhere).unwrap();
//! let line = enricher.enrich_line(b"dns 1.1.1.1 via 192.168.0.1");
//! assert_eq!(
//!     &*line,
//!     &b"dns 1.1.1.1(AustraliaQueenslandBrisbane) via 192.168.0.1(Local)"[..]
//! );
//! ```

pub mod classify;
pub mod enrich;
pub mod error;
pub mod exec;
pub mod extractor;
pub mod geoip;
pub mod input;
pub mod mmdb;
pub mod provision;
pub mod tag;

pub use crate::classify::{Classify, SpecialRanges};
pub use crate::enrich::Enricher;
pub use crate::error::Error;
pub use crate::extractor::{Extractor, ExtractorBuilder, Match, MatchKind};
pub use crate::geoip::{Location, Resolver, LOCAL_LABEL, UNKNOWN_LABEL};
pub use crate::mmdb::{Language, LocationLookup, MmdbLookup};
pub use crate::provision::{DatabaseSource, Provisioned};
pub use crate::tag::{Decoration, Tag, Tagged};
