/// A single member of a dynamic-keyed object: the key exactly as it appeared
/// in the source document, and its decoded value.
///
/// Entries are produced while decoding an [`OrderedDynamicMap`](crate::OrderedDynamicMap)
/// and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyedEntry<T> {
    pub key: String,
    pub value: T,
}

impl<T> KeyedEntry<T> {
    /// Creates an entry from a key and its value.
    pub fn new(key: impl Into<String>, value: T) -> Self {
        KeyedEntry {
            key: key.into(),
            value,
        }
    }

    /// Consumes the entry and returns its key and value.
    pub fn into_parts(self) -> (String, T) {
        (self.key, self.value)
    }
}

impl<T> From<KeyedEntry<T>> for (String, T) {
    fn from(entry: KeyedEntry<T>) -> Self {
        entry.into_parts()
    }
}
