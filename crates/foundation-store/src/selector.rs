//! Key selectors: an exact key or a regular-expression pattern.

use core::fmt;

use regex::Regex;

/// Selects one key exactly, or every key matching a pattern.
///
/// Selectors have a canonical string form used to identify watch rules:
/// the key itself for [`Selector::Exact`], and `/source/` for
/// [`Selector::Pattern`].
///
/// ```
/// use foundation_store::Selector;
///
/// let exact = Selector::from("cat");
/// assert!(exact.matches("cat"));
/// assert!(!exact.matches("bat"));
///
/// let pattern = Selector::pattern("(b|c)at").unwrap();
/// assert!(pattern.matches("bat"));
/// assert_eq!(pattern.canonical(), "/(b|c)at/");
/// ```
#[derive(Debug, Clone)]
pub enum Selector {
    /// A single literal key.
    Exact(String),
    /// Every key the regex matches (unanchored, like `Regex::is_match`).
    Pattern(Regex),
}

impl Selector {
    /// Select a single key.
    pub fn exact(key: impl Into<String>) -> Self {
        Self::Exact(key.into())
    }

    /// Compile `source` into a pattern selector.
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self::Pattern)
    }

    /// Parse a selector from text: `/source/` is a pattern, anything else is
    /// an exact key.
    pub fn parse(text: &str) -> Result<Self, regex::Error> {
        match text
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(source) if text.len() >= 2 => Self::pattern(source),
            _ => Ok(Self::exact(text)),
        }
    }

    /// The canonical string form.
    pub fn canonical(&self) -> String {
        match self {
            Self::Exact(key) => key.clone(),
            Self::Pattern(re) => format!("/{}/", re.as_str()),
        }
    }

    /// Whether `key` is selected.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Exact(k) => k == key,
            Self::Pattern(re) => re.is_match(key),
        }
    }

    /// Whether this selector is a regex pattern.
    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }

    /// The literal key, if this is an exact selector.
    pub fn as_exact(&self) -> Option<&str> {
        match self {
            Self::Exact(key) => Some(key),
            Self::Pattern(_) => None,
        }
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Selector {}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(key) => f.write_str(key),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for Selector {
    fn from(key: &str) -> Self {
        Self::Exact(key.to_string())
    }
}

impl From<String> for Selector {
    fn from(key: String) -> Self {
        Self::Exact(key)
    }
}

impl From<Regex> for Selector {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

impl From<&Selector> for Selector {
    fn from(selector: &Selector) -> Self {
        selector.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches_only_itself() {
        let s = Selector::from("a");
        assert!(s.matches("a"));
        assert!(!s.matches("ab"));
        assert_eq!(s.canonical(), "a");
        assert_eq!(s.as_exact(), Some("a"));
    }

    #[test]
    fn pattern_is_unanchored() {
        let s = Selector::pattern("a").unwrap();
        assert!(s.matches("a"));
        assert!(s.matches("bab"));
        assert!(!s.matches("b"));
        assert!(s.is_pattern());
    }

    #[test]
    fn parse_distinguishes_slashes() {
        assert_eq!(Selector::parse("/^a/").unwrap(), Selector::pattern("^a").unwrap());
        assert_eq!(Selector::parse("a/b").unwrap(), Selector::exact("a/b"));
        assert_eq!(Selector::parse("/").unwrap(), Selector::exact("/"));
        assert!(Selector::parse("/(/").is_err());
    }

    #[test]
    fn canonical_round_trips_through_parse() {
        let s = Selector::pattern("(b|c)at").unwrap();
        assert_eq!(Selector::parse(&s.canonical()).unwrap(), s);
        assert_eq!(s.to_string(), s.canonical());
    }

    #[test]
    fn exact_and_pattern_are_never_equal() {
        assert_ne!(Selector::exact("a"), Selector::pattern("a").unwrap());
    }
}
