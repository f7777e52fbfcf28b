use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Index;
use std::slice;
use std::vec;

use crate::entry::KeyedEntry;

/// A JSON object whose keys are data rather than schema, decoded into an
/// ordered list of [`KeyedEntry`] values.
///
/// Entries keep the order in which the keys appeared in the source object.
/// Duplicate keys are kept as separate entries at their original positions.
///
/// Two lookup modes are offered:
/// - **Positional**: [`get_index`](Self::get_index), `map[i]`, and iteration.
/// - **By key**: [`get`](Self::get) and [`find`](Self::find) scan the entries
///   in order and return the **first** match. Later duplicates of a key are
///   reachable only positionally.
///
/// Key lookup is a linear scan. The container adapts a single nested object
/// of a document and is not meant as an index; convert with
/// [`into_index_map`](Self::into_index_map) when many lookups are needed.
///
/// # Flattened fields
///
/// Under `#[serde(flatten)]`, serde buffers the leftover members before this
/// map sees them. A value that fails to decode there is reported without its
/// key: [`Error::path`](crate::Error::path) is empty.
///
/// # Example
///
/// ```
/// use ketone_core::OrderedDynamicMap;
///
/// let members: OrderedDynamicMap<bool> =
///     ketone_core::from_str(r#"{"ghopper": true, "alovelace": false}"#).unwrap();
///
/// assert_eq!(members[0].key, "ghopper");
/// assert_eq!(members.get("alovelace"), Some(&false));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderedDynamicMap<T> {
    entries: Vec<KeyedEntry<T>>,
}

impl<T> OrderedDynamicMap<T> {
    /// Returns the number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the source object had no members.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry at `index`, or None if out of range.
    pub fn get_index(&self, index: usize) -> Option<&KeyedEntry<T>> {
        self.entries.get(index)
    }

    /// Returns the first entry with the given key.
    pub fn find(&self, key: &str) -> Option<&KeyedEntry<T>> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    /// Returns the value of the first entry with the given key.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.find(key).map(|entry| &entry.value)
    }

    /// Returns the position of the first entry with the given key.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key == key)
    }

    /// Checks whether any entry has the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Returns the first entry in source order.
    pub fn first(&self) -> Option<&KeyedEntry<T>> {
        self.entries.first()
    }

    /// Returns the last entry in source order.
    pub fn last(&self) -> Option<&KeyedEntry<T>> {
        self.entries.last()
    }

    /// Iterates over the entries in source order.
    pub fn iter(&self) -> slice::Iter<'_, KeyedEntry<T>> {
        self.entries.iter()
    }

    /// Iterates over the keys in source order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Iterates over the values in source order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter().map(|entry| &entry.value)
    }

    /// Returns the entries as a slice.
    pub fn as_slice(&self) -> &[KeyedEntry<T>] {
        &self.entries
    }

    /// Consumes the map and returns its entries.
    pub fn into_entries(self) -> Vec<KeyedEntry<T>> {
        self.entries
    }
}

#[cfg(feature = "indexmap")]
impl<T> OrderedDynamicMap<T> {
    /// Converts into an `IndexMap` for repeated key lookups.
    ///
    /// For duplicate keys only the first occurrence is kept, so lookups give
    /// the same answers as [`get`](Self::get).
    pub fn into_index_map(self) -> indexmap::IndexMap<String, T> {
        let mut map = indexmap::IndexMap::with_capacity(self.entries.len());
        for entry in self.entries {
            map.entry(entry.key).or_insert(entry.value);
        }
        map
    }
}

#[cfg(feature = "indexmap")]
impl<T> From<OrderedDynamicMap<T>> for indexmap::IndexMap<String, T> {
    fn from(map: OrderedDynamicMap<T>) -> Self {
        map.into_index_map()
    }
}

// An absent node decodes as empty under `#[serde(default)]`.
impl<T> Default for OrderedDynamicMap<T> {
    fn default() -> Self {
        OrderedDynamicMap {
            entries: Vec::new(),
        }
    }
}

impl<T> Index<usize> for OrderedDynamicMap<T> {
    type Output = KeyedEntry<T>;

    /// Panics if `index` is out of range; use [`get_index`](Self::get_index)
    /// for a checked lookup.
    fn index(&self, index: usize) -> &KeyedEntry<T> {
        &self.entries[index]
    }
}

impl<T> IntoIterator for OrderedDynamicMap<T> {
    type Item = KeyedEntry<T>;
    type IntoIter = vec::IntoIter<KeyedEntry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a OrderedDynamicMap<T> {
    type Item = &'a KeyedEntry<T>;
    type IntoIter = slice::Iter<'a, KeyedEntry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'de, T> Deserialize<'de> for OrderedDynamicMap<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DynamicMapVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for DynamicMapVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = OrderedDynamicMap<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object with dynamic keys")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                // Read straight from the map stream: collecting into a map
                // type first would lose source order and duplicate keys.
                let mut entries = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    let value = map.next_value::<T>()?;
                    entries.push(KeyedEntry::new(key, value));
                }
                log::trace!("decoded dynamic map with {} entries", entries.len());
                Ok(OrderedDynamicMap { entries })
            }
        }

        deserializer.deserialize_map(DynamicMapVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, from_str};

    #[test]
    fn keeps_source_order() {
        let map: OrderedDynamicMap<u32> = from_str(r#"{"c": 1, "a": 2, "b": 3}"#).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["c", "a", "b"]);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn duplicates_are_kept_and_lookup_takes_first() {
        let map: OrderedDynamicMap<u32> = from_str(r#"{"a": 1, "b": 2, "a": 3}"#).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.position("a"), Some(0));
        assert_eq!(map[2], KeyedEntry::new("a", 3));
    }

    #[test]
    fn index_and_key_lookup_agree() {
        let map: OrderedDynamicMap<String> =
            from_str(r#"{"m1": "first", "m2": "second"}"#).unwrap();
        for (i, entry) in map.iter().enumerate() {
            assert_eq!(map[i].key, entry.key);
            assert_eq!(map.get(&entry.key), Some(&entry.value));
        }
    }

    #[test]
    fn missing_key_and_index_are_absent() {
        let map: OrderedDynamicMap<bool> = from_str(r#"{"ghopper": true}"#).unwrap();
        assert_eq!(map.get("eclarke"), None);
        assert!(!map.contains_key("eclarke"));
        assert!(map.get_index(1).is_none());
    }

    #[test]
    #[should_panic]
    fn index_out_of_range_panics() {
        let map: OrderedDynamicMap<bool> = from_str("{}").unwrap();
        let _ = &map[0];
    }

    #[test]
    fn empty_object() {
        let map: OrderedDynamicMap<bool> = from_str("{}").unwrap();
        assert!(map.is_empty());
        assert!(map.first().is_none());
        assert_eq!(map, OrderedDynamicMap::default());
    }

    #[test]
    fn non_object_is_shape_mismatch() {
        for json in ["[]", "null", "42", "\"one\"", "true"] {
            let err = from_str::<OrderedDynamicMap<u32>>(json).unwrap_err();
            match err {
                Error::ShapeMismatch { expected, .. } => {
                    assert_eq!(expected, "a JSON object with dynamic keys");
                }
                other => panic!("Expected ShapeMismatch for {json}, got {other:?}"),
            }
        }
    }

    #[test]
    fn value_failure_names_key() {
        let err = from_str::<OrderedDynamicMap<u32>>(r#"{"ok": 1, "bad": "x"}"#).unwrap_err();
        assert_eq!(err.key(), Some("bad"));
        assert!(matches!(err.root_cause(), Error::ShapeMismatch { .. }));
    }

    #[test]
    fn nested_maps_keep_order_per_level() {
        let map: OrderedDynamicMap<OrderedDynamicMap<bool>> =
            from_str(r#"{"z": {"y": true, "x": false}, "a": {"b": true}}"#).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["z", "a"]);
        assert_eq!(map[0].value.keys().collect::<Vec<_>>(), ["y", "x"]);
        assert_eq!(map.get("a").and_then(|m| m.get("b")), Some(&true));
    }

    #[derive(Debug, Deserialize)]
    struct Profile {
        name: String,
        #[serde(flatten)]
        rest: OrderedDynamicMap<u32>,
    }

    #[test]
    fn flattened_members_keep_order() {
        let profile: Profile = from_str(r#"{"z": 1, "name": "ghopper", "a": 2}"#).unwrap();
        assert_eq!(profile.name, "ghopper");
        assert_eq!(profile.rest.keys().collect::<Vec<_>>(), ["z", "a"]);
    }

    #[test]
    fn flattened_failure_has_no_key() {
        let err = from_str::<Profile>(r#"{"name": "ghopper", "a": "x"}"#).unwrap_err();
        assert_eq!(err.path(), "");
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn direct_serde_json_keeps_order_and_duplicates() {
        let map: OrderedDynamicMap<u8> =
            serde_json::from_str(r#"{"b": 1, "a": 2, "b": 3}"#).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["b", "a", "b"]);
    }

    #[test]
    fn iterates_owned_and_borrowed() {
        let map: OrderedDynamicMap<u8> = from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let sum: u32 = (&map).into_iter().map(|e| u32::from(e.value)).sum();
        assert_eq!(sum, 3);
        let last = map.iter().next_back().map(|e| e.key.as_str());
        assert_eq!(last, Some("b"));
        let owned: Vec<(String, u8)> = map.into_iter().map(Into::into).collect();
        assert_eq!(owned, [("a".to_string(), 1), ("b".to_string(), 2)]);
    }

    #[cfg(feature = "indexmap")]
    #[test]
    fn into_index_map_keeps_first_duplicate() {
        let map: OrderedDynamicMap<u32> = from_str(r#"{"x": 1, "y": 2, "x": 3}"#).unwrap();
        let index = map.into_index_map();
        assert_eq!(index.len(), 2);
        assert_eq!(index["x"], 1);
        assert_eq!(index.get_index(1), Some((&"y".to_string(), &2)));
    }
}
