use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use oxrdf::{NamedNode, NamedNodeRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value object ensuring that supplied text represents a valid IRI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iri {
    value: String,
}

impl Iri {
    /// Validates and constructs a new [`Iri`] value object.
    ///
    /// The constructor rejects malformed identifiers in order to guarantee that
    /// every concept and scheme uses canonical identifiers.
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        NamedNode::new(value.as_str()).map_err(|_| IriError::Invalid {
            value: value.clone(),
        })?;
        Ok(Self { value })
    }

    /// Wraps text coming out of a parser that already validated it.
    pub(crate) fn new_unchecked(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns the part after the last `#`, `/` or `:` delimiter.
    ///
    /// An IRI ending in a delimiter has an empty local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.value[self.split_at()..]
    }

    /// Returns the IRI up to and including its last delimiter.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.value[..self.split_at()]
    }

    /// Appends `local` to this IRI, inserting `#` unless the IRI already
    /// ends with a delimiter.
    pub fn join(&self, local: &str) -> Result<Self, IriError> {
        if self.value.ends_with(['#', '/']) {
            Self::new(format!("{}{local}", self.value))
        } else {
            Self::new(format!("{}#{local}", self.value))
        }
    }

    /// Borrows the IRI as an oxrdf named node.
    #[must_use]
    pub fn as_named_node(&self) -> NamedNodeRef<'_> {
        NamedNodeRef::new_unchecked(&self.value)
    }

    fn split_at(&self) -> usize {
        self.value
            .rfind('#')
            .or_else(|| self.value.rfind('/'))
            .or_else(|| self.value.rfind(':'))
            .map_or(0, |idx| idx + 1)
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for Iri {
    type Error = IriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Iri> for String {
    fn from(iri: Iri) -> Self {
        iri.value
    }
}

impl From<NamedNodeRef<'_>> for Iri {
    fn from(node: NamedNodeRef<'_>) -> Self {
        Self::new_unchecked(node.as_str())
    }
}

impl From<NamedNode> for Iri {
    fn from(node: NamedNode) -> Self {
        Self::new_unchecked(node.into_string())
    }
}

impl PartialEq<NamedNodeRef<'_>> for Iri {
    fn eq(&self, other: &NamedNodeRef<'_>) -> bool {
        self.value == other.as_str()
    }
}

/// Errors produced when validating an [`Iri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    /// The provided text could not be parsed as an IRI.
    #[error("invalid IRI: {value}")]
    Invalid { value: String },
}

#[cfg(test)]
mod tests {
    use super::Iri;

    #[test]
    fn accepts_valid_iri() {
        let iri = Iri::new("https://example.org/resource").expect("valid IRI");
        assert_eq!(iri.as_str(), "https://example.org/resource");
    }

    #[test]
    fn rejects_invalid_iri() {
        let err = Iri::new("not an iri").expect_err("invalid IRI");
        assert!(matches!(err, super::IriError::Invalid { value } if value == "not an iri"));
    }

    #[test]
    fn splits_hash_and_slash_namespaces() {
        let hash = Iri::new("http://my.edu/test#Klass").expect("valid IRI");
        assert_eq!(hash.namespace(), "http://my.edu/test#");
        assert_eq!(hash.local_name(), "Klass");

        let slash = Iri::new("http://purl.obolibrary.org/obo/GO_0008150").expect("valid IRI");
        assert_eq!(slash.local_name(), "GO_0008150");

        let urn = Iri::new("urn:isbn:0451450523").expect("valid IRI");
        assert_eq!(urn.local_name(), "0451450523");
    }

    #[test]
    fn join_inserts_fragment_delimiter_once() {
        let base = Iri::new("http://my.edu/test").expect("valid IRI");
        assert_eq!(
            base.join("Top").expect("joined").as_str(),
            "http://my.edu/test#Top"
        );
        let slashed = Iri::new("http://my.edu/test/").expect("valid IRI");
        assert_eq!(
            slashed.join("Top").expect("joined").as_str(),
            "http://my.edu/test/Top"
        );
    }

    #[test]
    fn round_trips_through_serde() {
        let iri = Iri::new("http://my.edu/test#Klass").expect("valid IRI");
        let json = serde_json::to_string(&iri).expect("serialize");
        assert_eq!(json, "\"http://my.edu/test#Klass\"");
        let back: Iri = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, iri);
        assert!(serde_json::from_str::<Iri>("\"not an iri\"").is_err());
    }
}
