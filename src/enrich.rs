use std::borrow::Cow;

use crate::classify::{Classify, SpecialRanges};
use crate::error::Result;
use crate::extractor::{Extractor, ExtractorBuilder};
use crate::geoip::{Resolver, LOCAL_LABEL};
use crate::mmdb::LocationLookup;
use crate::tag::{Decoration, Tag, Tagged};

/// The per-line pipeline: scan, classify, resolve, rewrite.
///
/// Everything it holds is built once and only read afterwards; lines are
/// handled one at a time and nothing is remembered between them.
#[derive(Debug)]
pub struct Enricher<L, C = SpecialRanges> {
    extractor: Extractor,
    classifier: C,
    resolver: Resolver<L>,
    decoration: Decoration,
}

impl<L: LocationLookup> Enricher<L, SpecialRanges> {
    /// An enricher using the default special-range policy.
    pub fn new(lookup: L) -> Result<Self> {
        Self::with_classifier(lookup, SpecialRanges)
    }
}

impl<L: LocationLookup, C: Classify> Enricher<L, C> {
    pub fn with_classifier(lookup: L, classifier: C) -> Result<Self> {
        Ok(Self {
            extractor: ExtractorBuilder::new().build()?,
            classifier,
            resolver: Resolver::new(lookup),
            decoration: Decoration::Plain,
        })
    }

    #[must_use]
    pub fn decoration(mut self, decoration: Decoration) -> Self {
        self.decoration = decoration;
        self
    }

    /// The label for one token. Special addresses never reach the resolver.
    #[inline]
    pub fn label(&self, token: &str) -> String {
        if self.classifier.is_special(token) {
            LOCAL_LABEL.to_string()
        } else {
            self.resolver.label(token)
        }
    }

    /// Annotate every token in a line. Lines without tokens come back
    /// borrowed and byte-for-byte identical.
    pub fn enrich_line<'a>(&self, line: &'a [u8]) -> Cow<'a, [u8]> {
        let mut tagged = Tagged::new(line).with_decoration(self.decoration);
        for m in self.extractor.find_iter(line) {
            let label = self.label(m.text());
            tagged = tagged.tag(Tag::from_match(&m, label));
        }
        tagged.annotate()
    }
}
