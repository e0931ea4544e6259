use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered name → occupancy table.
///
/// Lookup walks entries in insertion order and the first containment match
/// wins, so order is part of the table's meaning. Deserializing keeps the
/// document's key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueTable {
    entries: Vec<(String, u32)>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; an overwritten key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: u32) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Value for a feature display name, or 0 when nothing matches.
    ///
    /// A key matches when the name contains it or it contains the name. This
    /// accepts both abbreviated keys ("서울" for "서울특별시") and suffixed
    /// ones. When several keys match, the earliest entry wins regardless of
    /// how specific it is.
    pub fn resolve(&self, name: &str) -> u32 {
        self.resolve_entry(name).map(|(_, v)| v).unwrap_or(0)
    }

    /// The matching entry itself, for diagnostics.
    pub fn resolve_entry(&self, name: &str) -> Option<(&str, u32)> {
        if name.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(key, _)| !key.is_empty() && (name.contains(key.as_str()) || key.contains(name)))
            .map(|(k, v)| (k.as_str(), *v))
    }

    /// Overwrite values for keys already present; unknown keys are ignored.
    ///
    /// Returns how many entries changed.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut changed = 0;
        for (key, value) in overrides {
            if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
                if entry.1 != value {
                    entry.1 = value;
                    changed += 1;
                }
            }
        }
        changed
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for ValueTable {
    fn from_iter<T: IntoIterator<Item = (K, u32)>>(iter: T) -> Self {
        let mut table = ValueTable::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

impl Serialize for ValueTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct TableVisitor;

impl<'de> Visitor<'de> for TableVisitor {
    type Value = ValueTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of region name to integer percentage")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ValueTable, A::Error> {
        let mut table = ValueTable::new();
        while let Some((k, v)) = access.next_entry::<String, u32>()? {
            table.insert(k, v);
        }
        Ok(table)
    }
}

impl<'de> Deserialize<'de> for ValueTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TableVisitor)
    }
}

/// Occupancy bands used for map fill and tooltip labels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PressureBand {
    Red,
    Yellow,
    /// Value 0: no data.
    Empty,
    Green,
}

impl PressureBand {
    pub fn for_value(value: u32) -> Self {
        if value > 50 {
            PressureBand::Red
        } else if value > 30 {
            PressureBand::Yellow
        } else if value == 0 {
            PressureBand::Empty
        } else {
            PressureBand::Green
        }
    }

    /// CSS class used by the tooltip.
    pub fn label(self) -> &'static str {
        match self {
            PressureBand::Red => "red",
            PressureBand::Yellow => "yellow",
            PressureBand::Empty => "null",
            PressureBand::Green => "green",
        }
    }
}
