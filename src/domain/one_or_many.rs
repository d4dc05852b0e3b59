//! One-or-many JSON shape normalization.
//!
//! Counterparty lookups arrive as JSON whose cardinality depends on how
//! the query was built: a single object for a `row_to_json` projection, an
//! array for a `json_agg` one. [`OneOrMany`] makes that shape explicit and
//! is normalized into a single canonical record at the data-access
//! boundary, before any business logic touches it.

use serde::Deserialize;

/// A deserialized value that was either a single object or an array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// The source produced a single object.
    One(T),
    /// The source produced an array (possibly empty).
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Normalizes to a single canonical record: the object itself, or the
    /// first element of the array. An empty array yields `None`.
    #[must_use]
    pub fn normalize(self) -> Option<T> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.into_iter().next(),
        }
    }

    /// Number of records carried.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(values) => values.len(),
        }
    }

    /// Whether no record was carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
    struct Row {
        name: String,
    }

    #[test]
    fn single_object_normalizes_to_itself() {
        let json = r#"{"name": "Dana"}"#;
        let Ok(parsed) = serde_json::from_str::<OneOrMany<Row>>(json) else {
            panic!("parse failed");
        };
        assert_eq!(parsed.len(), 1);
        assert_eq!(
            parsed.normalize(),
            Some(Row {
                name: "Dana".to_string()
            })
        );
    }

    #[test]
    fn array_normalizes_to_first_element() {
        let json = r#"[{"name": "Dana"}, {"name": "Lee"}]"#;
        let Ok(parsed) = serde_json::from_str::<OneOrMany<Row>>(json) else {
            panic!("parse failed");
        };
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed.normalize(),
            Some(Row {
                name: "Dana".to_string()
            })
        );
    }

    #[test]
    fn empty_array_normalizes_to_none() {
        let json = "[]";
        let Ok(parsed) = serde_json::from_str::<OneOrMany<Row>>(json) else {
            panic!("parse failed");
        };
        assert!(parsed.is_empty());
        assert_eq!(parsed.normalize(), None);
    }
}
