//! Error types for the persistent store.

use alloc::string::String;
use core::fmt;

use crate::tag::TypeTag;

/// Error type for [`PersistentStore`](crate::PersistentStore) operations.
///
/// Generic over the backend's error type, so callers keep full access to
/// the underlying failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError<E: fmt::Debug + fmt::Display> {
    /// Error from the underlying property store.
    #[error("property store error: {0}")]
    Backend(E),
    /// The tag entry holds a name that is not a known type tag.
    #[error("unknown type tag {tag:?} for key {key:?}")]
    UnknownTypeTag { key: String, tag: String },
    /// The value entry exists but not in the primitive kind its tag implies.
    #[error("key {key:?} is tagged {tag} but holds a different kind of value")]
    TagMismatch { key: String, tag: TypeTag },
    /// Stored text could not be decoded back into its tagged type.
    #[error("malformed payload for key {key:?}: {reason}")]
    MalformedPayload { key: String, reason: String },
    /// The value has no representation in the property store.
    #[error("cannot encode value for key {key:?}: {reason}")]
    Encode { key: String, reason: String },
    /// Data keys may not end in the tag suffix.
    #[error("key {key:?} ends in the reserved tag suffix {suffix:?}")]
    ReservedKey { key: String, suffix: String },
}

impl<E: fmt::Debug + fmt::Display> From<E> for StoreError<E> {
    fn from(e: E) -> Self {
        Self::Backend(e)
    }
}

impl<E: fmt::Debug + fmt::Display> StoreError<E> {
    /// Whether this error came from reading a stored value back, as opposed
    /// to the backend or the caller's input.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTypeTag { .. } | Self::TagMismatch { .. } | Self::MalformedPayload { .. }
        )
    }
}
