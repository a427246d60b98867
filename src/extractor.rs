use std::borrow::Cow;
use std::ops::Range;

use regex_automata::meta::Regex;
use regex_syntax::hir::Hir;

use crate::error::{Error, Result};

/// Dotted quad of 1-3 digit groups between ASCII word boundaries. Octets are
/// not range checked here; `999.999.999.999` is still a token.
static IPV4_PATTERN: &str = r"(?-u:\b)(?:[0-9]{1,3}\.){3}[0-9]{1,3}(?-u:\b)";

/// IPv6 is only recognized inside square brackets, e.g. `[fe80::1]`, so that
/// `host:port` or `pid:123` never look like address fragments. Any bracketed
/// run of hex digits and colons is a token, so `[1234]` is one too; it simply
/// fails to resolve.
static IPV6_PATTERN: &str = r"\[([0-9A-Fa-f:]+)\]";

/// Which pattern produced a match.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatchKind {
    V4,
    V6,
}

/// An address token found in a line.
///
/// The range always covers the full matched text in the original line,
/// brackets included for IPv6, while `text` is the bare address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    text: String,
    range: Range<usize>,
    kind: MatchKind,
}

impl Match {
    #[inline]
    pub fn new<S: Into<String>>(text: S, range: Range<usize>, kind: MatchKind) -> Match {
        Match {
            text: text.into(),
            range,
            kind,
        }
    }

    /// The token without any enclosing brackets.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.range.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.range.end
    }

    /// Half-open byte range `[start, end)` over the unmodified line.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    #[inline]
    pub fn kind(&self) -> MatchKind {
        self.kind
    }
}

/// A searcher for finding IPv4 and bracketed IPv6 tokens in text.
///
/// Build it once and reuse it for every line; it holds no per-search state.
#[derive(Clone, Debug)]
pub struct Extractor {
    regex: Regex,
    kinds: Vec<MatchKind>,
    pattern_indices: Vec<usize>,
}

impl Extractor {
    /// Return an iterator of the tokens found in the haystack.
    ///
    /// Patterns never overlap, but callers should not rely on the yield order
    /// for anything positional.
    #[inline]
    pub fn find_iter<'a>(&'a self, haystack: &'a [u8]) -> impl Iterator<Item = Match> + 'a {
        self.regex.captures_iter(haystack).filter_map(move |caps| {
            let pid = caps.pattern()?.as_usize();
            let whole = caps.get_match()?.range();
            // The address itself lives in a pattern specific capture group
            let inner = caps.get_group(self.pattern_indices[pid])?.range();
            let text = String::from_utf8_lossy(&haystack[inner]).into_owned();
            Some(Match::new(text, whole, self.kinds[pid]))
        })
    }

    /// Collect every token in the haystack.
    #[inline]
    pub fn matches(&self, haystack: &[u8]) -> Vec<Match> {
        self.find_iter(haystack).collect()
    }
}

/// Builder for constructing a token extractor.
#[derive(Clone, Debug)]
pub struct ExtractorBuilder {
    include_ipv4: bool,
    include_ipv6: bool,
}

impl Default for ExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorBuilder {
    /// Create a new builder that looks for both IPv4 and IPv6 tokens.
    #[inline]
    pub fn new() -> Self {
        Self {
            include_ipv4: true,
            include_ipv6: true,
        }
    }

    /// Include or exclude IPv4 tokens.
    #[inline(always)]
    pub fn ipv4(&mut self, include: bool) -> &mut Self {
        self.include_ipv4 = include;
        self
    }

    /// Include or exclude bracketed IPv6 tokens.
    #[inline(always)]
    pub fn ipv6(&mut self, include: bool) -> &mut Self {
        self.include_ipv6 = include;
        self
    }

    /// Build the extractor with the current settings.
    pub fn build(&self) -> Result<Extractor> {
        let pattern_count = self.include_ipv4 as usize + self.include_ipv6 as usize;
        let mut patterns: Vec<Cow<'_, Hir>> = Vec::with_capacity(pattern_count);
        let mut kinds: Vec<MatchKind> = Vec::with_capacity(pattern_count);
        let mut pattern_indices: Vec<usize> = Vec::with_capacity(pattern_count);

        if self.include_ipv4 {
            let ipv4_hir: Hir = regex_syntax::Parser::new().parse(IPV4_PATTERN)?;
            patterns.push(Cow::Owned(ipv4_hir));
            kinds.push(MatchKind::V4);
            pattern_indices.push(0);
        }

        if self.include_ipv6 {
            let ipv6_hir: Hir = regex_syntax::Parser::new().parse(IPV6_PATTERN)?;
            patterns.push(Cow::Owned(ipv6_hir));
            kinds.push(MatchKind::V6);
            // group 1 is the address without its brackets
            pattern_indices.push(1);
        }

        if patterns.is_empty() {
            return Err(Error::NoPatterns);
        }

        let regex = Regex::builder()
            .configure(
                Regex::config()
                    .auto_prefilter(true)
                    .match_kind(regex_automata::MatchKind::LeftmostFirst),
            )
            .build_many_from_hir(&patterns)?;

        Ok(Extractor {
            regex,
            kinds,
            pattern_indices,
        })
    }
}
