//! Comment markup pipeline: linkify raw text, then filter it down to
//! an allow-listed markup subset
//!
//! User-submitted comment bodies enter as [`RawText`] and leave as
//! [`SanitizedMarkup`]. Only `SanitizedMarkup` may be handed to a
//! raw-markup renderer; the type has no public constructor, so the only
//! way to obtain one is through a [`MarkupSanitizer`].
//!
//! ## Limitations
//!
//! The bundled [`AllowListSanitizer`] is a regex filter, not an HTML
//! parser. It does not decode character references, so an `href` such as
//! `&#106;avascript:...` passes through. Literal tab, LF and CR characters
//! inside a `javascript:` scheme are skipped the way browsers skip them, so
//! `java<TAB>script:` is stripped. It does not repair attribute
//! values containing stray quotes or malformed nesting. Callers that need
//! a full DOM-validating sanitizer can supply their own
//! [`MarkupSanitizer`] implementation without touching anything else.

pub mod linkify;
pub mod sanitize;

pub use linkify::linkify;
pub use sanitize::{sanitize, AllowListSanitizer};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Unvalidated, potentially unsafe user-submitted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawText(String);

impl RawText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for RawText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for RawText {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Markup restricted to an allow-listed element/attribute subset
///
/// Deliberately not `Deserialize`: values read back from a store are
/// `RawText` until they pass through a sanitizer again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SanitizedMarkup(String);

impl SanitizedMarkup {
    pub(crate) fn from_filtered(markup: String) -> Self {
        Self(markup)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SanitizedMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedMarkup {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Element and attribute allow-list
///
/// Element names and attribute names are compared lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    elements: HashMap<String, HashSet<String>>,
}

impl AllowList {
    /// An allow-list that permits nothing
    pub fn empty() -> Self {
        Self {
            elements: HashMap::new(),
        }
    }

    /// Allow an element with the given attributes
    pub fn allow<I, S>(mut self, element: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let attrs = attributes
            .into_iter()
            .map(|a| a.as_ref().to_ascii_lowercase())
            .collect();
        self.elements.insert(element.to_ascii_lowercase(), attrs);
        self
    }

    pub fn allows_element(&self, element: &str) -> bool {
        self.elements.contains_key(&element.to_ascii_lowercase())
    }

    pub fn allows_attribute(&self, element: &str, attribute: &str) -> bool {
        self.elements
            .get(&element.to_ascii_lowercase())
            .is_some_and(|attrs| attrs.contains(&attribute.to_ascii_lowercase()))
    }

    /// Allowed element names, sorted
    pub fn element_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.elements.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for AllowList {
    /// `p, strong, em, span, div` with `style`; `a` with `href, target, rel`; bare `br`
    fn default() -> Self {
        Self::empty()
            .allow("p", ["style"])
            .allow("strong", ["style"])
            .allow("em", ["style"])
            .allow("span", ["style"])
            .allow("div", ["style"])
            .allow("a", ["href", "target", "rel"])
            .allow("br", Vec::<&str>::new())
    }
}

/// Reduces arbitrary markup to a safe subset
///
/// Implementations must be total (never fail) and idempotent:
/// `sanitize(sanitize(x)) == sanitize(x)`.
pub trait MarkupSanitizer: Send + Sync {
    fn sanitize(&self, input: &str) -> SanitizedMarkup;
}

/// Linkify user input and filter the result, ready for storage
pub fn prepare_comment(sanitizer: &dyn MarkupSanitizer, raw: &RawText) -> SanitizedMarkup {
    sanitizer.sanitize(&linkify(raw.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allow_list() {
        let list = AllowList::default();
        assert_eq!(
            list.element_names(),
            vec!["a", "br", "div", "em", "p", "span", "strong"]
        );
        assert!(list.allows_element("P"));
        assert!(!list.allows_element("script"));
        assert!(list.allows_attribute("a", "HREF"));
        assert!(list.allows_attribute("span", "style"));
        assert!(!list.allows_attribute("a", "style"));
        assert!(!list.allows_attribute("br", "style"));
        assert!(!list.allows_attribute("img", "src"));
    }

    #[test]
    fn test_prepare_comment_links_and_filters() {
        let sanitizer = AllowListSanitizer::default();
        let raw = RawText::from("<b>see</b> example.com");
        let out = prepare_comment(&sanitizer, &raw);
        assert_eq!(
            out.as_str(),
            r#"see <a href="http://example.com">example.com</a>"#
        );
    }

    #[test]
    fn test_prepare_comment_keeps_angle_bracketed_urls() {
        let sanitizer = AllowListSanitizer::default();
        let raw = RawText::from("see <https://school.org> and <tinyurl.com>");
        let out = prepare_comment(&sanitizer, &raw);
        assert_eq!(
            out.as_str(),
            concat!(
                r#"see <<a href="https://school.org">https://school.org</a>>"#,
                r#" and <<a href="http://tinyurl.com">tinyurl.com</a>>"#
            )
        );
    }

    #[test]
    fn test_prepare_comment_drops_tabbed_script_scheme() {
        let sanitizer = AllowListSanitizer::default();
        let raw = RawText::from("<a href=\"java\tscript:alert(1)\">x</a>");
        let out = prepare_comment(&sanitizer, &raw);
        assert_eq!(out.as_str(), r#"<a href="alert(1)">x</a>"#);
    }

    #[test]
    fn test_sanitized_markup_serializes_as_string() {
        let sanitizer = AllowListSanitizer::default();
        let markup = sanitizer.sanitize("<em>hi</em>");
        assert_eq!(serde_json::to_string(&markup).unwrap(), r#""<em>hi</em>""#);
    }
}
