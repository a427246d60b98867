use std::borrow::Cow;
use std::io::{self, Write};
use std::ops::Range;

use crate::extractor::Match;

/// How an annotation is rendered around its label.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Decoration {
    /// `(<label>)`
    #[default]
    Plain,
    /// `(<label>)` bookended with bold red ANSI escapes.
    Color,
}

impl Decoration {
    /// Render the annotation text for a label.
    #[inline]
    pub fn render(self, label: &str) -> String {
        match self {
            Decoration::Plain => format!("({})", label),
            Decoration::Color => format!("\x1b[1;31m({})\x1b[0;0m", label),
        }
    }
}

/// A label to be inserted right after a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// The range in the original text where the token was found.
    range: Range<usize>,
    /// The label placed after the token.
    label: String,
}

impl Tag {
    #[inline]
    pub fn new<S: Into<String>>(range: Range<usize>, label: S) -> Tag {
        Tag {
            range,
            label: label.into(),
        }
    }

    /// Tag a scanned token.
    #[inline]
    pub fn from_match<S: Into<String>>(m: &Match, label: S) -> Tag {
        Tag::new(m.range(), label)
    }

    #[inline]
    #[must_use]
    pub fn range(&self) -> &Range<usize> {
        &self.range
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A line of text with tags.
#[derive(Clone, Debug)]
pub struct Tagged<'a> {
    /// The original, unmodified line. Tag ranges index into this.
    text: &'a [u8],
    tags: Vec<Tag>,
    decoration: Decoration,
}

impl<'a> Tagged<'a> {
    /// Create a new `Tagged` container for a line.
    #[inline]
    #[must_use]
    pub fn new(text: &'a [u8]) -> Tagged<'a> {
        Tagged {
            text,
            // Most lines have few IPs
            tags: Vec::with_capacity(4),
            decoration: Decoration::Plain,
        }
    }

    /// Adds a tag to this line. Tags may be added in any order.
    #[inline]
    #[must_use]
    pub fn tag(mut self, tag: Tag) -> Self {
        debug_assert!(tag.range.end <= self.text.len());
        self.tags.push(tag);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decoration = decoration;
        self
    }

    /// Produce the annotated line.
    ///
    /// Insertions happen right to left, ordered by descending end offset, so
    /// that every offset still to be processed refers to text that has not
    /// shifted yet. Without tags the original line is returned as is.
    pub fn annotate(&self) -> Cow<'a, [u8]> {
        if self.tags.is_empty() {
            return Cow::Borrowed(self.text);
        }

        let mut order: Vec<&Tag> = self.tags.iter().collect();
        // stable, so equal ends keep insertion order
        order.sort_by(|a, b| b.range.end.cmp(&a.range.end));

        let rendered: Vec<String> = order
            .iter()
            .map(|tag| self.decoration.render(&tag.label))
            .collect();
        let extra: usize = rendered.iter().map(String::len).sum();

        let mut out = Vec::with_capacity(self.text.len() + extra);
        out.extend_from_slice(self.text);
        for (tag, annotation) in order.iter().zip(&rendered) {
            let at = tag.range.end;
            out.splice(at..at, annotation.bytes());
        }
        Cow::Owned(out)
    }

    /// Writes the annotated line, without a terminator.
    #[inline]
    pub fn write<W: Write + ?Sized>(&self, wtr: &mut W) -> io::Result<()> {
        wtr.write_all(&self.annotate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::MatchKind;

    fn annotate(line: &str, tags: Vec<Tag>) -> String {
        let tagged = tags
            .into_iter()
            .fold(Tagged::new(line.as_bytes()), |tagged, tag| tagged.tag(tag));
        String::from_utf8(tagged.annotate().into_owned()).unwrap()
    }

    #[test]
    fn no_tags_borrows_the_line() {
        let line = b"nothing to see 1.2.3";
        let out = Tagged::new(line).annotate();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(&*out, line);
    }

    #[test]
    fn single_tag_lands_after_token() {
        assert_eq!(
            annotate("from 8.8.8.8 ok", vec![Tag::new(5..12, "US")]),
            "from 8.8.8.8(US) ok"
        );
    }

    #[test]
    fn tag_at_end_of_line() {
        assert_eq!(
            annotate("peer 1.1.1.1", vec![Tag::new(5..12, "AU")]),
            "peer 1.1.1.1(AU)"
        );
    }

    #[test]
    fn many_tags_of_varying_lengths_in_any_order() {
        let line = "a 1.1.1.1 b [2001:db8::1] c 100.200.30.4 d [::1]";
        let expected = "a 1.1.1.1(XY) b [2001:db8::1](Local) c 100.200.30.4(SomewhereLong) d [::1](Local)";
        let tags = vec![
            Tag::new(2..9, "XY"),
            Tag::new(12..25, "Local"),
            Tag::new(28..40, "SomewhereLong"),
            Tag::new(43..48, "Local"),
        ];

        assert_eq!(annotate(line, tags.clone()), expected);

        let mut reversed = tags.clone();
        reversed.reverse();
        assert_eq!(annotate(line, reversed), expected);

        let shuffled = vec![
            tags[2].clone(),
            tags[0].clone(),
            tags[3].clone(),
            tags[1].clone(),
        ];
        assert_eq!(annotate(line, shuffled), expected);
    }

    #[test]
    fn adjacent_tokens_keep_their_order() {
        // "1.1.1.1,2.2.2.2"
        assert_eq!(
            annotate("1.1.1.1,2.2.2.2", vec![Tag::new(8..15, "B"), Tag::new(0..7, "A")]),
            "1.1.1.1(A),2.2.2.2(B)"
        );
    }

    #[test]
    fn color_wraps_the_annotation() {
        let out = Tagged::new(b"x 9.9.9.9")
            .with_decoration(Decoration::Color)
            .tag(Tag::new(2..9, "CH"))
            .annotate()
            .into_owned();
        assert_eq!(out, b"x 9.9.9.9\x1b[1;31m(CH)\x1b[0;0m".to_vec());
    }

    #[test]
    fn non_utf8_bytes_survive() {
        let line = b"\xff 1.2.3.4 \xfe";
        let out = Tagged::new(line).tag(Tag::new(2..9, "Z")).annotate();
        assert_eq!(&*out, b"\xff 1.2.3.4(Z) \xfe");
    }

    #[test]
    fn tag_from_match_spans_the_whole_token() {
        let m = Match::new("fe80::1", 5..14, MatchKind::V6);
        let tag = Tag::from_match(&m, "Local");
        assert_eq!(tag.range(), &(5..14));
        assert_eq!(tag.label(), "Local");
        assert_eq!(
            annotate("from [fe80::1]:22", vec![tag]),
            "from [fe80::1](Local):22"
        );
    }

    #[test]
    fn write_emits_annotated_bytes() {
        let mut buf = Vec::new();
        Tagged::new(b"ip 4.4.4.4")
            .tag(Tag::new(3..10, "US"))
            .write(&mut buf)
            .unwrap();
        assert_eq!(buf, b"ip 4.4.4.4(US)");
    }
}
