use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

/// A primitive value as held natively by a property backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Property {
    Bool(bool),
    String(String),
    Int(i64),
    Double(f64),
    List(Vec<String>),
}

impl Property {
    /// Short lowercase name of the primitive kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::List(_) => "list",
        }
    }
}

/// A single write in a [`PropertyStore::apply_batch`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyOp {
    Set(String, Property),
    Remove(String),
}

/// Core trait for a flat, primitive-only property store.
///
/// This is the durable layer a [`PersistentStore`](crate::PersistentStore)
/// is built on. It understands booleans, strings, integers, doubles and
/// string lists keyed by name, and nothing richer; type fidelity for other
/// shapes is added on top by the persistent store's tag entries.
///
/// Backends implement the four raw operations. The typed accessors are
/// provided and return `Ok(None)` when the property is absent or holds a
/// different primitive kind.
pub trait PropertyStore {
    /// Error type for this backend.
    type Error: fmt::Debug + fmt::Display;

    /// Read a property.
    fn get_property(&self, name: &str) -> Result<Option<Property>, Self::Error>;

    /// Create or overwrite a property.
    fn set_property(&mut self, name: &str, value: Property) -> Result<(), Self::Error>;

    /// Delete a property. Deleting an absent property is not an error.
    fn remove_property(&mut self, name: &str) -> Result<(), Self::Error>;

    /// List all property names in ascending order.
    fn list_properties(&self) -> Result<Vec<String>, Self::Error>;

    /// Check if a property exists.
    fn has_property(&self, name: &str) -> Result<bool, Self::Error> {
        Ok(self.get_property(name)?.is_some())
    }

    /// Apply several writes as one unit.
    ///
    /// The default applies them in order; transactional backends override
    /// this so a reader never observes a partial batch.
    fn apply_batch(&mut self, ops: Vec<PropertyOp>) -> Result<(), Self::Error> {
        for op in ops {
            match op {
                PropertyOp::Set(name, value) => self.set_property(&name, value)?,
                PropertyOp::Remove(name) => self.remove_property(&name)?,
            }
        }
        Ok(())
    }

    /// Remove every property.
    fn clear(&mut self) -> Result<(), Self::Error> {
        for name in self.list_properties()? {
            self.remove_property(&name)?;
        }
        Ok(())
    }

    fn get_bool(&self, name: &str) -> Result<Option<bool>, Self::Error> {
        Ok(match self.get_property(name)? {
            Some(Property::Bool(b)) => Some(b),
            _ => None,
        })
    }

    fn set_bool(&mut self, name: &str, value: bool) -> Result<(), Self::Error> {
        self.set_property(name, Property::Bool(value))
    }

    fn get_string(&self, name: &str) -> Result<Option<String>, Self::Error> {
        Ok(match self.get_property(name)? {
            Some(Property::String(s)) => Some(s),
            _ => None,
        })
    }

    fn set_string(&mut self, name: &str, value: &str) -> Result<(), Self::Error> {
        self.set_property(name, Property::String(value.into()))
    }

    fn get_int(&self, name: &str) -> Result<Option<i64>, Self::Error> {
        Ok(match self.get_property(name)? {
            Some(Property::Int(i)) => Some(i),
            _ => None,
        })
    }

    fn set_int(&mut self, name: &str, value: i64) -> Result<(), Self::Error> {
        self.set_property(name, Property::Int(value))
    }

    fn get_double(&self, name: &str) -> Result<Option<f64>, Self::Error> {
        Ok(match self.get_property(name)? {
            Some(Property::Double(d)) => Some(d),
            _ => None,
        })
    }

    fn set_double(&mut self, name: &str, value: f64) -> Result<(), Self::Error> {
        self.set_property(name, Property::Double(value))
    }

    fn get_list(&self, name: &str) -> Result<Option<Vec<String>>, Self::Error> {
        Ok(match self.get_property(name)? {
            Some(Property::List(items)) => Some(items),
            _ => None,
        })
    }

    fn set_list(&mut self, name: &str, value: Vec<String>) -> Result<(), Self::Error> {
        self.set_property(name, Property::List(value))
    }
}
