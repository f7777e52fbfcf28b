use serde::{Deserialize, Deserializer};
use std::ops::{Deref, Index};

use crate::entry::KeyedEntry;
use crate::map::OrderedDynamicMap;

/// A document whose top level is itself a dynamic-keyed object.
///
/// Decodes exactly like an [`OrderedDynamicMap`] and derefs to one, so every
/// read operation is available unchanged. Use it to decode a whole database
/// node without inventing a wrapper field:
///
/// ```
/// use ketone_core::DynamicRoot;
///
/// let root: DynamicRoot<u64> = ketone_core::from_str(r#"{"one": 1, "two": 2}"#).unwrap();
/// assert_eq!(root[1].key, "two");
/// assert_eq!(root.get("one"), Some(&1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DynamicRoot<T>(OrderedDynamicMap<T>);

impl<T> DynamicRoot<T> {
    /// Returns the wrapped map.
    pub fn as_map(&self) -> &OrderedDynamicMap<T> {
        &self.0
    }

    /// Consumes the root and returns the wrapped map.
    pub fn into_inner(self) -> OrderedDynamicMap<T> {
        self.0
    }
}

impl<T> From<OrderedDynamicMap<T>> for DynamicRoot<T> {
    fn from(map: OrderedDynamicMap<T>) -> Self {
        DynamicRoot(map)
    }
}

impl<T> Default for DynamicRoot<T> {
    fn default() -> Self {
        DynamicRoot(OrderedDynamicMap::default())
    }
}

// Not a smart pointer: the root is a map with no operations of its own, and
// `Deref` forwards every read to it.
impl<T> Deref for DynamicRoot<T> {
    type Target = OrderedDynamicMap<T>;

    fn deref(&self) -> &OrderedDynamicMap<T> {
        &self.0
    }
}

impl<T> AsRef<OrderedDynamicMap<T>> for DynamicRoot<T> {
    fn as_ref(&self) -> &OrderedDynamicMap<T> {
        &self.0
    }
}

impl<T> Index<usize> for DynamicRoot<T> {
    type Output = KeyedEntry<T>;

    fn index(&self, index: usize) -> &KeyedEntry<T> {
        &self.0[index]
    }
}

impl<T> IntoIterator for DynamicRoot<T> {
    type Item = KeyedEntry<T>;
    type IntoIter = std::vec::IntoIter<KeyedEntry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a DynamicRoot<T> {
    type Item = &'a KeyedEntry<T>;
    type IntoIter = std::slice::Iter<'a, KeyedEntry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de, T> Deserialize<'de> for DynamicRoot<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        OrderedDynamicMap::deserialize(deserializer).map(DynamicRoot)
    }
}
