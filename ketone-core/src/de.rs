use serde::de::value::BorrowedStrDeserializer;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, Error as _, MapAccess, SeqAccess,
    Unexpected, VariantAccess, Visitor,
};
use serde::{Deserialize, forward_to_deserialize_any};
use serde_json::Number;
use std::io;
use std::iter::Enumerate;
use std::slice;

use crate::document::Document;
use crate::error::Error;

/// Decodes `T` from JSON text.
///
/// The text is parsed into an order-preserving [`Document`] first, so dynamic
/// maps see every member in source order (duplicates included), and a failure
/// deep inside the document reports the full key path.
pub fn from_str<T: DeserializeOwned>(json: &str) -> Result<T, Error> {
    let document: Document = serde_json::from_str(json)?;
    log::debug!("parsed JSON document ({} bytes)", json.len());
    from_document(&document)
}

/// Decodes `T` from UTF-8 encoded JSON bytes.
pub fn from_slice<T: DeserializeOwned>(json: &[u8]) -> Result<T, Error> {
    let document: Document = serde_json::from_slice(json)?;
    log::debug!("parsed JSON document ({} bytes)", json.len());
    from_document(&document)
}

/// Decodes `T` from a reader holding one complete JSON document.
pub fn from_reader<R: io::Read, T: DeserializeOwned>(reader: R) -> Result<T, Error> {
    let document: Document = serde_json::from_reader(reader)?;
    log::debug!("parsed JSON document from reader");
    from_document(&document)
}

/// Decodes `T` from an already-parsed `serde_json::Value`.
///
/// See [`Document`]'s `From<serde_json::Value>` impl for how duplicate keys
/// are affected.
pub fn from_value<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, Error> {
    let document = Document::from(value);
    from_document(&document)
}

/// Decodes `T` from a parsed document. Strings may borrow from `document`.
pub fn from_document<'de, T: Deserialize<'de>>(document: &'de Document) -> Result<T, Error> {
    T::deserialize(document)
}

fn visit_number<'de, V: Visitor<'de>>(n: &Number, visitor: V) -> Result<V::Value, Error> {
    if let Some(u) = n.as_u64() {
        visitor.visit_u64(u)
    } else if let Some(i) = n.as_i64() {
        visitor.visit_i64(i)
    } else if let Some(f) = n.as_f64() {
        visitor.visit_f64(f)
    } else {
        Err(Error::custom(format_args!("unrepresentable number {n}")))
    }
}

fn visit_array<'de, V: Visitor<'de>>(items: &'de [Document], visitor: V) -> Result<V::Value, Error> {
    let mut access = ArrayAccess {
        items: items.iter().enumerate(),
    };
    let value = visitor.visit_seq(&mut access)?;
    if access.items.len() == 0 {
        Ok(value)
    } else {
        Err(Error::invalid_length(items.len(), &"fewer elements in array"))
    }
}

fn visit_object<'de, V: Visitor<'de>>(
    members: &'de [(String, Document)],
    visitor: V,
) -> Result<V::Value, Error> {
    let mut access = ObjectAccess {
        members: members.iter(),
        pending: None,
    };
    let value = visitor.visit_map(&mut access)?;
    if access.members.len() == 0 {
        Ok(value)
    } else {
        Err(Error::invalid_length(members.len(), &"fewer members in object"))
    }
}

impl<'de> de::Deserializer<'de> for &'de Document {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self {
            Document::Null => visitor.visit_unit(),
            Document::Bool(b) => visitor.visit_bool(*b),
            Document::Number(n) => visit_number(n, visitor),
            Document::String(s) => visitor.visit_borrowed_str(s),
            Document::Array(items) => visit_array(items, visitor),
            Document::Object(members) => visit_object(members, visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self {
            Document::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self {
            Document::Null => visitor.visit_unit(),
            other => Err(Error::invalid_type(other.unexpected(), &visitor)),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self {
            Document::Array(items) => visit_array(items, visitor),
            other => Err(Error::invalid_type(other.unexpected(), &visitor)),
        }
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self {
            Document::Object(members) => visit_object(members, visitor),
            other => Err(Error::invalid_type(other.unexpected(), &visitor)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self {
            Document::Object(members) => visit_object(members, visitor),
            Document::Array(items) => visit_array(items, visitor),
            other => Err(Error::invalid_type(other.unexpected(), &visitor)),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self {
            Document::String(s) => visitor.visit_enum(BorrowedStrDeserializer::<Error>::new(s)),
            Document::Object(members) if members.len() == 1 => {
                let (variant, value) = &members[0];
                visitor.visit_enum(VariantDocument { variant, value })
            }
            other => Err(Error::invalid_type(other.unexpected(), &visitor)),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit_struct tuple tuple_struct identifier ignored_any
    }
}

struct ArrayAccess<'de> {
    items: Enumerate<slice::Iter<'de, Document>>,
}

impl<'de> SeqAccess<'de> for ArrayAccess<'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Error> {
        match self.items.next() {
            Some((index, item)) => seed
                .deserialize(item)
                .map(Some)
                .map_err(|source| Error::at_index(index, source)),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct ObjectAccess<'de> {
    members: slice::Iter<'de, (String, Document)>,
    pending: Option<&'de (String, Document)>,
}

impl<'de> MapAccess<'de> for ObjectAccess<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Error> {
        let Some(member) = self.members.next() else {
            return Ok(None);
        };
        self.pending = Some(member);
        let key = member.0.as_str();
        seed.deserialize(MapKey { key })
            .map(Some)
            .map_err(|source| Error::at_key(key, source))
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Error> {
        let (key, value) = self
            .pending
            .take()
            .ok_or_else(|| Error::custom("object value requested before its key"))?;
        seed.deserialize(value)
            .map_err(|source| Error::at_key(key, source))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.members.len())
    }
}

/// An object key. JSON keys are always strings; numeric and boolean key
/// types are parsed from the key text, as `serde_json` does.
struct MapKey<'de> {
    key: &'de str,
}

macro_rules! deserialize_parsed_key {
    ($($method:ident => $ty:ty, $visit:ident;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
                match self.key.parse::<$ty>() {
                    Ok(v) => visitor.$visit(v),
                    Err(_) => Err(Error::invalid_type(Unexpected::Str(self.key), &visitor)),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for MapKey<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_borrowed_str(self.key)
    }

    deserialize_parsed_key! {
        deserialize_bool => bool, visit_bool;
        deserialize_i8 => i8, visit_i8;
        deserialize_i16 => i16, visit_i16;
        deserialize_i32 => i32, visit_i32;
        deserialize_i64 => i64, visit_i64;
        deserialize_i128 => i128, visit_i128;
        deserialize_u8 => u8, visit_u8;
        deserialize_u16 => u16, visit_u16;
        deserialize_u32 => u32, visit_u32;
        deserialize_u64 => u64, visit_u64;
        deserialize_u128 => u128, visit_u128;
        deserialize_f32 => f32, visit_f32;
        deserialize_f64 => f64, visit_f64;
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_enum(BorrowedStrDeserializer::<Error>::new(self.key))
    }

    forward_to_deserialize_any! {
        char str string bytes byte_buf unit unit_struct seq tuple tuple_struct
        map struct identifier ignored_any
    }
}

/// An externally tagged enum value: `{"Variant": value}`.
struct VariantDocument<'de> {
    variant: &'de str,
    value: &'de Document,
}

impl<'de> EnumAccess<'de> for VariantDocument<'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self), Error> {
        let variant = seed.deserialize(BorrowedStrDeserializer::<Error>::new(self.variant))?;
        Ok((variant, self))
    }
}

impl<'de> VariantAccess<'de> for VariantDocument<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        match self.value {
            Document::Null => Ok(()),
            other => Err(Error::at_key(
                self.variant,
                Error::invalid_type(other.unexpected(), &"unit variant"),
            )),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, Error> {
        seed.deserialize(self.value)
            .map_err(|source| Error::at_key(self.variant, source))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_seq(self.value, visitor)
            .map_err(|source| Error::at_key(self.variant, source))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_struct(self.value, "", fields, visitor)
            .map_err(|source| Error::at_key(self.variant, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Message {
        name: String,
        message: String,
        timestamp: u64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    enum Presence {
        Online,
        Away { since: u64 },
        Typing(String),
    }

    #[test]
    fn decodes_fixed_record() {
        let msg: Message = from_str(
            r#"{"name": "eclarke", "message": "The relay seems to be malfunctioning.", "timestamp": 1459361875337}"#,
        )
        .unwrap();
        assert_eq!(msg.name, "eclarke");
        assert_eq!(msg.timestamp, 1459361875337);
    }

    #[test]
    fn missing_field_is_reported() {
        let err = from_str::<Message>(r#"{"name": "eclarke", "timestamp": 1}"#).unwrap_err();
        assert!(matches!(err, Error::MissingField("message")));
    }

    #[test]
    fn wrong_type_reports_key() {
        let err =
            from_str::<Message>(r#"{"name": 5, "message": "m", "timestamp": 1}"#).unwrap_err();
        assert_eq!(err.key(), Some("name"));
        assert!(matches!(err.root_cause(), Error::ShapeMismatch { .. }));
    }

    #[test]
    fn array_failure_reports_index() {
        let err = from_str::<Vec<u32>>("[1, 2, \"three\"]").unwrap_err();
        assert_eq!(err.path(), "[2]");
    }

    #[test]
    fn options_and_null() {
        let v: Vec<Option<bool>> = from_str("[true, null, false]").unwrap();
        assert_eq!(v, [Some(true), None, Some(false)]);
    }

    #[test]
    fn enums() {
        let v: Vec<Presence> =
            from_str(r#"["Online", {"Away": {"since": 12}}, {"Typing": "m1"}]"#).unwrap();
        assert_eq!(
            v,
            [
                Presence::Online,
                Presence::Away { since: 12 },
                Presence::Typing("m1".to_string()),
            ]
        );
    }

    #[test]
    fn borrowed_strings() {
        let document: Document = serde_json::from_str(r#"{"ghopper": "Grace"}"#).unwrap();
        let names: BTreeMap<&str, &str> = from_document(&document).unwrap();
        assert_eq!(names["ghopper"], "Grace");
    }

    #[test]
    fn numbers_widen_and_narrow() {
        let v: (u8, i64, f64) = from_str("[7, -3, 0.5]").unwrap();
        assert_eq!(v, (7, -3, 0.5));
        assert!(from_str::<u8>("300").is_err());
    }

    #[test]
    fn syntax_error() {
        let err = from_str::<Message>("{\"name\": ").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn reader_and_slice_agree() {
        let json = br#"{"name": "a", "message": "b", "timestamp": 3}"#;
        let from_bytes: Message = from_slice(json).unwrap();
        let from_read: Message = from_reader(&json[..]).unwrap();
        assert_eq!(from_bytes, from_read);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Leaderboard {
        by_rank: BTreeMap<u32, String>,
        seen: BTreeMap<bool, u8>,
    }

    #[derive(Debug, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
    #[serde(rename_all = "lowercase")]
    enum Role {
        Owner,
        Guest,
    }

    #[test]
    fn integer_and_bool_keys() {
        let board: Leaderboard = from_str(
            r#"{"by_rank": {"2": "eclarke", "1": "ghopper"}, "seen": {"true": 1, "false": 0}}"#,
        )
        .unwrap();
        assert_eq!(board.by_rank[&1], "ghopper");
        assert_eq!(board.by_rank.keys().copied().collect::<Vec<_>>(), [1, 2]);
        assert_eq!(board.seen[&true], 1);
        assert_eq!(board.seen[&false], 0);
    }

    #[test]
    fn signed_and_enum_keys() {
        let offsets: BTreeMap<i64, u8> = from_str(r#"{"-5": 1, "7": 2}"#).unwrap();
        assert_eq!(offsets[&-5], 1);

        let halves: BTreeMap<u8, f64> = from_str(r#"{"1": 0.5}"#).unwrap();
        assert_eq!(halves[&1], 0.5);

        let roles: BTreeMap<Role, u8> = from_str(r#"{"owner": 1, "guest": 2}"#).unwrap();
        assert_eq!(roles[&Role::Guest], 2);
    }

    #[test]
    fn unparseable_key_reports_key() {
        let err = from_str::<Leaderboard>(r#"{"by_rank": {"first": "ghopper"}, "seen": {}}"#)
            .unwrap_err();
        assert_eq!(err.path(), "by_rank.first");
        assert!(matches!(err.root_cause(), Error::ShapeMismatch { .. }));
    }

    #[test]
    fn keyed_maps_agree_with_serde_json() {
        let json = r#"{"by_rank": {"1": "ghopper", "2": "eclarke"}, "seen": {"true": 1}}"#;
        let ours: Leaderboard = from_str(json).unwrap();
        let theirs: Leaderboard = serde_json::from_str(json).unwrap();
        assert_eq!(ours, theirs);
    }

    #[test]
    fn tuple_with_extra_elements_is_rejected() {
        assert!(from_str::<(u8, u8)>("[1, 2, 3]").is_err());
    }
}
