use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Unexpected, Visitor};
use serde_json::Number;
use std::fmt;

/// An owned JSON tree that keeps object members exactly as they appeared in
/// the source text: in source order, duplicates included.
///
/// Objects are stored as member lists rather than maps. This is the tree the
/// crate's decoding entry points parse into before handing values to serde.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Document>),
    Object(Vec<(String, Document)>),
}

impl Document {
    /// Returns the JSON type name of this value.
    pub fn kind(&self) -> &'static str {
        match self {
            Document::Null => "null",
            Document::Bool(_) => "boolean",
            Document::Number(_) => "number",
            Document::String(_) => "string",
            Document::Array(_) => "array",
            Document::Object(_) => "object",
        }
    }

    /// Returns the members of an object, in source order.
    pub fn as_object(&self) -> Option<&[(String, Document)]> {
        match self {
            Document::Object(members) => Some(members.as_slice()),
            _ => None,
        }
    }

    pub(crate) fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Document::Null => Unexpected::Other("null"),
            Document::Bool(b) => Unexpected::Bool(*b),
            Document::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Unexpected::Unsigned(u)
                } else if let Some(i) = n.as_i64() {
                    Unexpected::Signed(i)
                } else {
                    Unexpected::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Document::String(s) => Unexpected::Str(s),
            Document::Array(_) => Unexpected::Other("array"),
            Document::Object(_) => Unexpected::Other("object"),
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = Document;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any JSON value")
            }

            fn visit_bool<E>(self, v: bool) -> Result<Document, E> {
                Ok(Document::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Document, E> {
                Ok(Document::Number(v.into()))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Document, E> {
                Ok(Document::Number(v.into()))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Document, E>
            where
                E: serde::de::Error,
            {
                Number::from_f64(v)
                    .map(Document::Number)
                    .ok_or_else(|| E::invalid_value(Unexpected::Float(v), &"a finite number"))
            }

            fn visit_str<E>(self, v: &str) -> Result<Document, E> {
                Ok(Document::String(v.to_string()))
            }

            fn visit_string<E>(self, v: String) -> Result<Document, E> {
                Ok(Document::String(v))
            }

            fn visit_unit<E>(self) -> Result<Document, E> {
                Ok(Document::Null)
            }

            fn visit_none<E>(self) -> Result<Document, E> {
                Ok(Document::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Document, D::Error>
            where
                D: Deserializer<'de>,
            {
                Document::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Document, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Document::Array(items))
            }

            fn visit_map<M>(self, mut map: M) -> Result<Document, M::Error>
            where
                M: MapAccess<'de>,
            {
                // Members are appended as the parser yields them; a repeated
                // key becomes a second member rather than replacing the first.
                let mut members = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, Document>()? {
                    members.push((key, value));
                }
                Ok(Document::Object(members))
            }
        }

        deserializer.deserialize_any(DocumentVisitor)
    }
}

/// Converts an already-parsed `serde_json::Value`.
///
/// Object order is kept (serde_json is built with `preserve_order`), but a
/// `Value` has already collapsed duplicate keys; parse text with
/// [`from_str`](crate::from_str) when duplicates matter.
impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Bool(b),
            Value::Number(n) => Document::Number(n),
            Value::String(s) => Document::String(s),
            Value::Array(items) => Document::Array(items.into_iter().map(Document::from).collect()),
            Value::Object(map) => Document::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Document::from(value)))
                    .collect(),
            ),
        }
    }
}
