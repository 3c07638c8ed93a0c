//! Allow-list markup filter
//!
//! Scans left to right for tag-shaped substrings (`<`, optional `/`, a tag
//! name, an attribute blob, `>`):
//!
//! - tags whose name is not allow-listed are deleted; their text content
//!   stays behind as plain text
//! - allow-listed tags are re-emitted keeping only `name="value"` pairs
//!   whose name is allowed for that element; `href` values lose any
//!   leading `javascript:` scheme (tab, LF and CR inside the scheme are
//!   ignored, as browsers do), the rest of the value is kept
//! - everything that does not look like a tag passes through untouched
//!
//! Deleting a tag can splice its neighbours into a new tag shape
//! (`<<b>script>`). After a deletion the scan carries on from the earliest
//! `<` since the last emitted `>` that can still open a tag, so spliced
//! tags are caught within the same pass and the work stays linear in the
//! input length.

use super::{AllowList, MarkupSanitizer, SanitizedMarkup};
use regex::{Captures, Regex};
use std::sync::OnceLock;

const SCRIPT_SCHEME: &str = "javascript:";

/// Cached tag shape pattern; group 1 is the tag name, group 2 the attribute blob
fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?([A-Za-z]+)([^>]*)>").expect("tag pattern is valid"))
}

/// Cached `name="value"` pattern
fn attribute_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([A-Za-z]+)="([^"]*)""#).expect("attribute pattern is valid"))
}

/// Byte length of a leading `javascript:` in `value` (case-insensitive),
/// skipping tab, LF and CR anywhere inside the scheme
fn script_scheme_len(value: &str) -> Option<usize> {
    let mut expected = SCRIPT_SCHEME.chars();
    let mut want = expected.next();
    for (i, c) in value.char_indices() {
        let Some(w) = want else { return Some(i) };
        if matches!(c, '\t' | '\n' | '\r') {
            continue;
        }
        if !c.eq_ignore_ascii_case(&w) {
            return None;
        }
        want = expected.next();
    }
    want.is_none().then_some(value.len())
}

/// Remove every leading `javascript:` scheme from an `href` value, along
/// with whitespace or control characters before it
fn strip_script_scheme(value: &str) -> &str {
    let mut rest = value;
    loop {
        let trimmed =
            rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c.is_ascii_control());
        match script_scheme_len(trimmed) {
            Some(len) => rest = &trimmed[len..],
            None => return rest,
        }
    }
}

/// Regex-based allow-list sanitizer
#[derive(Debug, Clone, Default)]
pub struct AllowListSanitizer {
    allow_list: AllowList,
}

impl AllowListSanitizer {
    /// Create a sanitizer with a custom allow-list
    pub fn new(allow_list: AllowList) -> Self {
        Self { allow_list }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Re-emit an allow-listed tag with only its allowed attributes
    fn rebuild_tag(&self, caps: &Captures<'_>) -> String {
        let name = &caps[1];
        let closing = caps[0].starts_with("</");

        let mut tag = String::with_capacity(caps[0].len());
        tag.push('<');
        if closing {
            tag.push('/');
        }
        tag.push_str(name);

        for attr in attribute_pattern().captures_iter(&caps[2]) {
            let attr_name = &attr[1];
            if !self.allow_list.allows_attribute(name, attr_name) {
                continue;
            }
            let value = if attr_name.eq_ignore_ascii_case("href") {
                strip_script_scheme(&attr[2])
            } else {
                &attr[2]
            };
            tag.push(' ');
            tag.push_str(attr_name);
            tag.push_str("=\"");
            tag.push_str(value);
            tag.push('"');
        }

        tag.push('>');
        tag
    }

    /// Re-emit a complete tag into `out` if allowed; returns true when dropped
    fn filter_tag(&self, tag: &str, out: &mut String) -> bool {
        match tag_pattern().captures(tag) {
            Some(caps) if self.allow_list.allows_element(&caps[1]) => {
                out.push_str(&self.rebuild_tag(&caps));
                false
            }
            _ => true,
        }
    }
}

impl MarkupSanitizer for AllowListSanitizer {
    fn sanitize(&self, input: &str) -> SanitizedMarkup {
        let mut out = String::with_capacity(input.len());
        // Leftmost `<` after the last emitted `>` that opens a tag shape
        let mut opener: Option<usize> = None;
        let mut stripped = 0usize;

        for c in input.chars() {
            if c == '>' {
                match opener.take() {
                    Some(start) => {
                        let mut tag = out.split_off(start);
                        tag.push('>');
                        if self.filter_tag(&tag, &mut out) {
                            stripped += 1;
                        }
                    }
                    None => out.push('>'),
                }
                continue;
            }

            if opener.is_none() && c.is_ascii_alphabetic() {
                if out.ends_with('<') {
                    opener = Some(out.len() - 1);
                } else if out.ends_with("</") {
                    opener = Some(out.len() - 2);
                }
            }
            out.push(c);
        }

        if stripped > 0 {
            tracing::debug!(stripped, "Disallowed markup removed");
        }

        SanitizedMarkup::from_filtered(out)
    }
}

/// Sanitize with the default allow-list
pub fn sanitize(input: &str) -> SanitizedMarkup {
    static DEFAULT: OnceLock<AllowListSanitizer> = OnceLock::new();
    DEFAULT.get_or_init(AllowListSanitizer::default).sanitize(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::linkify;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::time::{Duration, Instant};

    fn clean(input: &str) -> String {
        sanitize(input).into_inner()
    }

    /// Short strings over a markup-heavy alphabet
    fn random_markup(rng: &mut StdRng) -> String {
        const PIECES: &[&str] = &[
            "<", ">", "/", "\"", "=", " ", ".", ":", "\t", "a", "b", "p", "x", "br", "href",
            "style", "script", "javascript:", "com", "org", "http://",
        ];
        let len = rng.gen_range(0..24);
        (0..len)
            .map(|_| PIECES[rng.gen_range(0..PIECES.len())])
            .collect()
    }

    #[test]
    fn test_script_tags_removed_text_kept() {
        assert_eq!(clean("<script>alert(1)</script>hello"), "alert(1)hello");
    }

    #[test]
    fn test_javascript_href_prefix_stripped() {
        assert_eq!(
            clean(r#"<a href="javascript:alert(1)">x</a>"#),
            r#"<a href="alert(1)">x</a>"#
        );
        assert_eq!(
            clean(r#"<a href="JaVaScRiPt:alert(1)">x</a>"#),
            r#"<a href="alert(1)">x</a>"#
        );
    }

    #[test]
    fn test_repeated_and_padded_script_scheme_stripped() {
        assert_eq!(
            clean(r#"<a href="javascript:javascript:alert(1)">x</a>"#),
            r#"<a href="alert(1)">x</a>"#
        );
        assert_eq!(
            clean(r#"<a href=" javascript:alert(1)">x</a>"#),
            r#"<a href="alert(1)">x</a>"#
        );
    }

    #[test]
    fn test_script_scheme_only_stripped_as_prefix() {
        let input = r#"<a href="http://x.org/?q=javascript:1">x</a>"#;
        assert_eq!(clean(input), input);
    }

    #[test]
    fn test_disallowed_attributes_dropped() {
        assert_eq!(
            clean(r#"<p onclick="steal()" style="color:red">hi</p>"#),
            r#"<p style="color:red">hi</p>"#
        );
        assert_eq!(
            clean(r#"<a href="http://a.org" target="_blank" rel="noopener" style="x">a</a>"#),
            r#"<a href="http://a.org" target="_blank" rel="noopener">a</a>"#
        );
    }

    #[test]
    fn test_disallowed_elements_removed() {
        assert_eq!(clean(r#"<img src="x" onerror="alert(1)">pic"#), "pic");
        assert_eq!(clean("<iframe src=evil></iframe>ok"), "ok");
        assert_eq!(clean("<b>bold</b> <i>it</i>"), "bold it");
    }

    #[test]
    fn test_tag_case_preserved_and_matched_insensitively() {
        assert_eq!(clean("<P>x</P><SCRIPT>y</SCRIPT>"), "<P>x</P>y");
    }

    #[test]
    fn test_br_variants() {
        assert_eq!(clean("a<br>b"), "a<br>b");
        assert_eq!(clean("a<br/>b"), "a<br>b");
        assert_eq!(clean(r#"a<br style="x">b"#), "a<br>b");
    }

    #[test]
    fn test_unquoted_attributes_dropped() {
        assert_eq!(clean("<a href=http://x.org>x</a>"), "<a>x</a>");
    }

    #[test]
    fn test_malformed_markup_left_as_text() {
        assert_eq!(clean("1 < 2 and 3 > 2"), "1 < 2 and 3 > 2");
        assert_eq!(clean("<<>>"), "<<>>");
        assert_eq!(clean("<p"), "<p");
    }

    #[test]
    fn test_spliced_tags_removed() {
        assert_eq!(clean("<<b>script>alert(1)<</b>/script>"), "alert(1)");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "plain",
            "<script>alert(1)</script>hello",
            r#"<a href="javascript:javascript:x">y</a>"#,
            r#"<div 1x="1"y="2" style="a">z</div>"#,
            "<<b>script>",
            r#"<a href="x>y">z</a>"#,
            r#"<span style="color:blue" title="t">s</span><br/>"#,
        ];
        for input in inputs {
            let once = clean(input);
            assert_eq!(clean(&once), once, "input: {input}");
        }
    }

    #[test]
    fn test_linkified_output_survives() {
        let linked = linkify("visit example.com now");
        assert_eq!(clean(&linked), linked);
    }

    #[test]
    fn test_custom_allow_list() {
        let sanitizer = AllowListSanitizer::new(AllowList::empty().allow("b", ["class"]));
        let out = sanitizer.sanitize(r#"<b class="k" id="i">x</b><p>y</p>"#);
        assert_eq!(out.as_str(), r#"<b class="k">x</b>y"#);
    }

    #[test]
    fn test_strip_script_scheme() {
        assert_eq!(strip_script_scheme("javascript:"), "");
        assert_eq!(strip_script_scheme("http://x"), "http://x");
        assert_eq!(strip_script_scheme("\tJAVASCRIPT:a"), "a");
        assert_eq!(strip_script_scheme("java"), "java");
        assert_eq!(strip_script_scheme("java\tscript:alert(1)"), "alert(1)");
        assert_eq!(strip_script_scheme("jav\nasc\rript:x"), "x");
        assert_eq!(strip_script_scheme("java script:x"), "java script:x");
    }

    #[test]
    fn test_script_scheme_with_embedded_tabs_and_newlines_stripped() {
        assert_eq!(
            clean("<a href=\"java\tscript:alert(1)\">x</a>"),
            r#"<a href="alert(1)">x</a>"#
        );
        assert_eq!(
            clean("<a href=\"\nJava\r\nScript:javascript\t:alert(1)\">x</a>"),
            r#"<a href="alert(1)">x</a>"#
        );
    }

    #[test]
    fn test_deeply_spliced_input_is_linear() {
        let n = 64_000;
        let input = format!("{}{}", "<".repeat(n), "b>".repeat(n));

        let started = Instant::now();
        let out = clean(&input);

        assert_eq!(out, "");
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn test_unclosed_tag_after_removal_kept_as_text() {
        assert_eq!(clean("<x <b>"), "");
        assert_eq!(clean("<<b>p"), "<p");
        assert_eq!(clean("a <<b>/b> c"), "a  c");
    }

    #[test]
    fn test_generated_inputs_idempotent() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..5_000 {
            let input = random_markup(&mut rng);
            let once = clean(&input);
            assert_eq!(clean(&once), once, "input: {input:?}");

            let linked = clean(&linkify(&input));
            assert_eq!(clean(&linked), linked, "input: {input:?}");
        }
    }

    #[test]
    fn test_generated_inputs_keep_only_allowed_markup() {
        let allow = AllowList::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..5_000 {
            let input = random_markup(&mut rng);
            let out = clean(&linkify(&input));

            for tag in tag_pattern().captures_iter(&out) {
                assert!(allow.allows_element(&tag[1]), "{out:?} from {input:?}");
                for attr in attribute_pattern().captures_iter(&tag[2]) {
                    assert!(
                        allow.allows_attribute(&tag[1], &attr[1]),
                        "{out:?} from {input:?}"
                    );
                    if attr[1].eq_ignore_ascii_case("href") {
                        assert_eq!(strip_script_scheme(&attr[2]), &attr[2], "{out:?}");
                    }
                }
            }
        }
    }
}
