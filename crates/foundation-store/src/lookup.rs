//! Lookup results shared by both stores.

/// A key together with its value, returned by the `*_with_keys` lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    pub key: String,
    pub value: T,
}

impl<T> Entry<T> {
    /// Pair a key with its value.
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Result of a lookup by [`Selector`](crate::Selector).
///
/// Exact selectors produce [`Lookup::One`], patterns produce
/// [`Lookup::Many`] (possibly empty).
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    One(Option<T>),
    Many(Vec<T>),
}

impl<T> Lookup<T> {
    /// The single result of an exact lookup. Always `None` for patterns.
    pub fn into_one(self) -> Option<T> {
        match self {
            Self::One(value) => value,
            Self::Many(_) => None,
        }
    }

    /// Flatten into a list regardless of shape.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => value.into_iter().collect(),
            Self::Many(values) => values,
        }
    }

    /// Number of results. Exact lookups give 0 or 1.
    pub fn len(&self) -> usize {
        match self {
            Self::One(value) => usize::from(value.is_some()),
            Self::Many(values) => values.len(),
        }
    }

    /// True when nothing was found.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply `f` to every result, keeping the lookup shape.
    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> Lookup<U> {
        match self {
            Self::One(value) => Lookup::One(value.map(f)),
            Self::Many(values) => Lookup::Many(values.into_iter().map(&mut f).collect()),
        }
    }
}
