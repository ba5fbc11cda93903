//! Insertion-ordered label table.
//!
//! Every labelled output (partition tables, trend windows, the instrument
//! registry) is emitted as a JSON object whose key order matters to the
//! presentation layer: range buckets in table order, tenors ascending,
//! categorical labels in first-appearance order. `LabeledTable` keeps that
//! order without pulling in a map crate.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered mapping from label to value, serialized as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for LabeledTable<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> LabeledTable<V> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing (in place) any existing entry with the same label.
    ///
    /// Returns the replaced value, if any.
    pub fn insert(&mut self, label: impl Into<String>, value: V) -> Option<V> {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((label, value));
                None
            }
        }
    }

    /// Look up a value by label.
    pub fn get(&self, label: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    /// Whether the table has an entry for `label`.
    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    /// Iterate `(label, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v))
    }
}

impl<V> FromIterator<(String, V)> for LabeledTable<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut table = LabeledTable::new();
        for (label, value) in iter {
            table.insert(label, value);
        }
        table
    }
}

impl<V: Serialize> Serialize for LabeledTable<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}
