//! Linkifier: wrap URL-like tokens in anchor elements
//!
//! A token is URL-like when it either carries an `http://`, `https://` or
//! `ftp://` scheme, or looks like `<host>.<tld>` with an alphabetic TLD of
//! at least two letters; an optional path may follow. Matches never span
//! whitespace. Tokens without a recognised scheme get `http://` prepended in
//! the `href`; the visible text is always the token exactly as written.
//!
//! Only element-shaped tags count as markup: a name followed directly by
//! whitespace, `/` or `>`, with no `<` before the closing `>`. Existing `<a>`
//! tags and their bodies are copied verbatim, as are double-quoted attribute
//! values of other tags, so linkifying linkified output never nests anchors.
//! Angle-bracketed URLs such as `<https://school.org>` or `<tinyurl.com>`
//! are not element-shaped and get linked like any other text.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Schemes that are kept verbatim in the generated `href`
const KNOWN_SCHEMES: [&str; 3] = ["http://", "https://", "ftp://"];

/// Cached URL token pattern
fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:(?i:https?|ftp)://)?[A-Za-z0-9_.\-]+\.[A-Za-z]{2,}(?:/[A-Za-z0-9_\-.~:/?#\[\]@!$&'()*+,;=]*)?",
        )
        .expect("URL pattern is valid")
    })
}

/// Cached element tag pattern; group 1 is the tag name
fn element_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"</?([A-Za-z]+)(?:[\s/][^<>]*)?>").expect("element pattern is valid")
    })
}

/// Build the `href` for a matched token
fn normalize_url(token: &str) -> Cow<'_, str> {
    let has_scheme = KNOWN_SCHEMES.iter().any(|scheme| {
        token
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    if has_scheme {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(format!("http://{}", token))
    }
}

/// Linkify a run of plain text (no markup inside)
fn linkify_text(text: &str) -> Cow<'_, str> {
    url_pattern().replace_all(text, |caps: &Captures<'_>| {
        let token = &caps[0];
        format!(r#"<a href="{}">{}</a>"#, normalize_url(token), token)
    })
}

/// Linkify the parts of a tag that sit outside double-quoted values
fn linkify_unquoted(tag: &str) -> String {
    tag.split('"')
        .enumerate()
        .map(|(i, part)| {
            if i % 2 == 0 {
                linkify_text(part)
            } else {
                Cow::Borrowed(part)
            }
        })
        .collect::<Vec<_>>()
        .join("\"")
}

/// Convert bare URLs in `text` into anchor markup
///
/// Pure and total: empty input yields empty output and text without
/// URL-like tokens is returned unchanged.
pub fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut anchor_depth = 0usize;
    let mut cursor = 0;

    for caps in element_pattern().captures_iter(text) {
        let Some(tag) = caps.get(0) else { continue };
        let plain = &text[cursor..tag.start()];
        if anchor_depth == 0 {
            out.push_str(&linkify_text(plain));
        } else {
            out.push_str(plain);
        }

        if caps[1].eq_ignore_ascii_case("a") {
            if tag.as_str().starts_with("</") {
                anchor_depth = anchor_depth.saturating_sub(1);
            } else {
                anchor_depth += 1;
            }
            out.push_str(tag.as_str());
        } else if anchor_depth == 0 {
            out.push_str(&linkify_unquoted(tag.as_str()));
        } else {
            out.push_str(tag.as_str());
        }
        cursor = tag.end();
    }

    let rest = &text[cursor..];
    if anchor_depth == 0 {
        out.push_str(&linkify_text(rest));
    } else {
        out.push_str(rest);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_domain_gets_http_prefix() {
        assert_eq!(
            linkify("visit example.com now"),
            r#"visit <a href="http://example.com">example.com</a> now"#
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(linkify(""), "");
    }

    #[test]
    fn test_text_without_urls_unchanged() {
        let text = "No links here, just a sentence. And another one!";
        assert_eq!(linkify(text), text);
        assert_eq!(linkify("version 1.2 is out"), "version 1.2 is out");
    }

    #[test]
    fn test_explicit_schemes_kept() {
        assert_eq!(
            linkify("https://school.org/news?id=3#top"),
            r#"<a href="https://school.org/news?id=3#top">https://school.org/news?id=3#top</a>"#
        );
        assert_eq!(
            linkify("ftp://files.school.org/a.pdf"),
            r#"<a href="ftp://files.school.org/a.pdf">ftp://files.school.org/a.pdf</a>"#
        );
    }

    #[test]
    fn test_scheme_match_is_case_insensitive() {
        assert_eq!(
            linkify("HTTPS://Example.COM"),
            r#"<a href="HTTPS://Example.COM">HTTPS://Example.COM</a>"#
        );
    }

    #[test]
    fn test_path_without_scheme() {
        assert_eq!(
            linkify("see www.school.edu/events/2024"),
            r#"see <a href="http://www.school.edu/events/2024">www.school.edu/events/2024</a>"#
        );
    }

    #[test]
    fn test_multiple_matches() {
        assert_eq!(
            linkify("a.com and b.org"),
            r#"<a href="http://a.com">a.com</a> and <a href="http://b.org">b.org</a>"#
        );
    }

    #[test]
    fn test_match_does_not_cross_whitespace() {
        let out = linkify("example .com");
        assert_eq!(out, "example .com");
    }

    #[test]
    fn test_trailing_period_not_part_of_tld() {
        assert_eq!(
            linkify("Go to example.com."),
            r#"Go to <a href="http://example.com">example.com</a>."#
        );
    }

    #[test]
    fn test_linkify_twice_does_not_nest() {
        let once = linkify("visit example.com and https://x.org/p now");
        let twice = linkify(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_existing_markup_left_alone() {
        let text = r#"<span style="x">read news.org</span>"#;
        assert_eq!(
            linkify(text),
            r#"<span style="x">read <a href="http://news.org">news.org</a></span>"#
        );
    }

    #[test]
    fn test_angle_bracketed_urls_linked() {
        assert_eq!(
            linkify("see <https://school.org> and <tinyurl.com>"),
            concat!(
                r#"see <<a href="https://school.org">https://school.org</a>>"#,
                r#" and <<a href="http://tinyurl.com">tinyurl.com</a>>"#
            )
        );
    }

    #[test]
    fn test_angle_bracketed_urls_linked_once() {
        let once = linkify("mail me <www.school.org/contact> or <ftp://files.school.org>");
        assert_eq!(linkify(&once), once);
    }

    #[test]
    fn test_existing_anchor_body_and_attributes_left_alone() {
        let text = r#"<a href="https://a.org" title="b.org">c.org</a> d.org"#;
        assert_eq!(
            linkify(text),
            r#"<a href="https://a.org" title="b.org">c.org</a> <a href="http://d.org">d.org</a>"#
        );
    }

    #[test]
    fn test_quoted_attribute_values_left_alone() {
        let text = r#"<span style="background:url(img.school.org/bg.png)">x</span>"#;
        assert_eq!(linkify(text), text);
    }
}
