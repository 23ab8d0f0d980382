//! Type tags persisted next to each value.

use core::fmt;
use core::str::FromStr;

/// Suffix appended to a key to form the name of its tag entry.
pub const DEFAULT_TAG_SUFFIX: &str = "_type";

/// Marker recording which [`DynamicValue`](crate::DynamicValue) variant a
/// persisted entry was written from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    String,
    Int,
    Double,
    List,
    Object,
}

/// A tag string that names no known [`TypeTag`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type tag: {0:?}")]
pub struct UnknownTag(pub String);

impl TypeTag {
    /// All tags, in declaration order.
    pub const ALL: [TypeTag; 6] = [
        TypeTag::Bool,
        TypeTag::String,
        TypeTag::Int,
        TypeTag::Double,
        TypeTag::List,
        TypeTag::Object,
    ];

    /// The name written to the property store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::String => "String",
            Self::Int => "Int",
            Self::Double => "Double",
            Self::List => "List",
            Self::Object => "Object",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bool" => Ok(Self::Bool),
            "String" => Ok(Self::String),
            "Int" => Ok(Self::Int),
            "Double" => Ok(Self::Double),
            "List" => Ok(Self::List),
            // Older property files spell the object tag in lowercase.
            "Object" | "object" => Ok(Self::Object),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for tag in TypeTag::ALL {
            assert_eq!(tag.as_str().parse::<TypeTag>().unwrap(), tag);
        }
    }

    #[test]
    fn lowercase_object_is_accepted() {
        assert_eq!("object".parse::<TypeTag>().unwrap(), TypeTag::Object);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "Float".parse::<TypeTag>().unwrap_err();
        assert_eq!(err, UnknownTag("Float".into()));
        assert!("bool".parse::<TypeTag>().is_err());
    }
}
