use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::traits::{Property, PropertyStore};

/// In-memory property backend.
///
/// All properties live in a `BTreeMap`; nothing touches disk.
/// Ideal for testing and prototyping, and as the backing store of
/// a [`PersistentStore`](crate::PersistentStore) that only needs to
/// outlive a single component.
///
/// # Example
///
/// ```
/// use foundation_store::{MemoryProperties, PropertyStore};
///
/// let mut props = MemoryProperties::new();
/// props.set_int("launches", 3).unwrap();
///
/// assert_eq!(props.get_int("launches").unwrap(), Some(3));
/// assert_eq!(props.get_string("launches").unwrap(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryProperties {
    props: BTreeMap<String, Property>,
}

/// Error type for the in-memory backend.
///
/// This backend never actually fails, but the trait requires an error type.
#[derive(Debug, Clone, thiserror::Error)]
#[error("memory properties error: {0}")]
pub struct MemoryError(String);

impl MemoryProperties {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored properties, tag entries included.
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// True when no property is stored.
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

impl PropertyStore for MemoryProperties {
    type Error = MemoryError;

    fn get_property(&self, name: &str) -> Result<Option<Property>, Self::Error> {
        Ok(self.props.get(name).cloned())
    }

    fn set_property(&mut self, name: &str, value: Property) -> Result<(), Self::Error> {
        self.props.insert(name.to_string(), value);
        Ok(())
    }

    fn remove_property(&mut self, name: &str) -> Result<(), Self::Error> {
        self.props.remove(name);
        Ok(())
    }

    fn list_properties(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.props.keys().cloned().collect())
    }

    fn has_property(&self, name: &str) -> Result<bool, Self::Error> {
        Ok(self.props.contains_key(name))
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.props.clear();
        Ok(())
    }
}
