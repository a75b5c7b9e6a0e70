//! The in-memory hierarchical document model.
//!
//! This module defines the [`Value`] enum, which represents any value a
//! document can hold, and [`Document`], an insertion-ordered string-keyed
//! map. Together they are the adapter's output (and input) representation:
//! nested key-value maps and ordered arrays, as used by document databases.
//!
use alloc::{string::String, vec::Vec};

use bstr::BString;

use crate::protocol::Kind;

/// An ordered sequence of values.
pub type Array = Vec<Value>;

/// A value stored in a document.
///
/// There is deliberately no null variant: a field either closes with a value
/// or is never written, and an absent key already expresses "unset."
///
/// # Examples
///
/// ```
/// use docmodem::{doc, Value};
///
/// let v = Value::from("payload");
/// assert_eq!(v.as_str(), Some("payload"));
///
/// let d = Value::from(doc! { "inner" => 7i32 });
/// assert!(d.as_document().is_some());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Boolean.
    Boolean(bool),
    /// 32-bit integer. 8- and 16-bit protocol writes widen into this slot.
    Int32(i32),
    /// 64-bit integer.
    Int64(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 text.
    String(String),
    /// Opaque byte sequence.
    Binary(BString),
    /// Ordered array.
    Array(Array),
    /// Nested document.
    Document(Document),
}

impl Value {
    /// The protocol [`Kind`] this value replays as.
    ///
    /// Documents replay as `Struct` and arrays as `List`; whether the caller
    /// actually reads them as a map or a set is the schema layer's call, and
    /// both read paths accept the shared representation.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Value::Boolean(_) => Kind::Bool,
            Value::Int32(_) => Kind::I32,
            Value::Int64(_) => Kind::I64,
            Value::Double(_) => Kind::Double,
            Value::String(_) => Kind::Text,
            Value::Binary(_) => Kind::Bytes,
            Value::Array(_) => Kind::List,
            Value::Document(_) => Kind::Struct,
        }
    }

    /// Returns the boolean if this is a [`Boolean`](Value::Boolean) value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is an [`Int32`](Value::Int32) value.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer if this is an [`Int64`](Value::Int64) value.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float if this is a [`Double`](Value::Double) value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text if this is a [`String`](Value::String) value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes if this is a [`Binary`](Value::Binary) value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Returns the elements if this is an [`Array`](Value::Array) value.
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the fragment if this is a [`Document`](Value::Document) value.
    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<BString> for Value {
    fn from(v: BString) -> Self {
        Self::Binary(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Binary(BString::from(v))
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Self::Document(v)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(v: Vec<V>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

/// An insertion-ordered, string-keyed document fragment.
///
/// Insertion order is observable (it drives the order in which a stored
/// document replays as protocol events) but equality is structural: two
/// documents are equal when they hold the same key-to-value mapping,
/// whatever the order the keys arrived in.
///
/// # Examples
///
/// ```
/// use docmodem::doc;
///
/// let a = doc! { "x" => 1i32, "y" => 2i32 };
/// let b = doc! { "y" => 2i32, "x" => 1i32 };
/// assert_eq!(a, b);
/// assert_eq!(a.get("y").and_then(|v| v.as_i32()), Some(2));
/// ```
#[derive(Clone, Default)]
pub struct Document {
    entries: Vec<(String, Value)>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an empty document with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a key-value pair, returning the previous value for the key.
    ///
    /// Re-inserting an existing key replaces its value in place, keeping the
    /// key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        for (existing, slot) in &mut self.entries {
            if *existing == key {
                return Some(core::mem::replace(slot, value));
            }
        }
        self.entries.push((key, value));
        None
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Whether the document contains `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The entry at `index` in insertion order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&str, &Value)> {
        self.entries.get(index).map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut document = Document::new();
        for (k, v) in iter {
            document.insert(k, v);
        }
        document
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = alloc::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Escapes quotes, backslashes and control characters for inclusion in a
/// rendered string literal.
fn write_escaped_string<W: core::fmt::Write>(src: &str, f: &mut W) -> core::fmt::Result {
    for c in src.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c if c.is_ascii_control() => {
                write!(f, "\\u{:04X}", c as u32)?;
            }
            _ => f.write_char(c)?,
        }
    }
    Ok(())
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(s) => {
                f.write_str("\"")?;
                write_escaped_string(s, f)?;
                f.write_str("\"")
            }
            // Debug of a byte string renders quoted with \x escapes, which
            // is as close to readable as arbitrary bytes get.
            Value::Binary(b) => write!(f, "{b:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                let mut first = true;
                for item in items {
                    if !first {
                        f.write_str(",")?;
                    }
                    first = false;
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Document(d) => write!(f, "{d}"),
        }
    }
}

impl core::fmt::Display for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            f.write_str("\"")?;
            write_escaped_string(key, f)?;
            write!(f, "\":{value}")?;
        }
        f.write_str("}")
    }
}

// Hand-written rather than derived so a `Document` crosses serde as a map
// and `Value` stays untagged.
#[cfg(feature = "serde")]
mod serde_impls {
    use alloc::{string::String, vec::Vec};
    use core::fmt;

    use bstr::BString;
    use serde::{
        Deserialize, Deserializer, Serialize, Serializer,
        de::{MapAccess, SeqAccess, Visitor},
        ser::{SerializeMap, SerializeSeq},
    };

    use super::{Document, Value};

    impl Serialize for Value {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match self {
                Value::Boolean(b) => serializer.serialize_bool(*b),
                Value::Int32(v) => serializer.serialize_i32(*v),
                Value::Int64(v) => serializer.serialize_i64(*v),
                Value::Double(v) => serializer.serialize_f64(*v),
                Value::String(s) => serializer.serialize_str(s),
                Value::Binary(b) => serializer.serialize_bytes(b.as_slice()),
                Value::Array(items) => {
                    let mut seq = serializer.serialize_seq(Some(items.len()))?;
                    for item in items {
                        seq.serialize_element(item)?;
                    }
                    seq.end()
                }
                Value::Document(d) => d.serialize(serializer),
            }
        }
    }

    impl Serialize for Document {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self.iter() {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }
    }

    struct ValueVisitor;

    impl<'de> Visitor<'de> for ValueVisitor {
        type Value = Value;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a document value")
        }

        fn visit_bool<E>(self, v: bool) -> Result<Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Value::Boolean(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Value, E>
        where
            E: serde::de::Error,
        {
            Ok(i32::try_from(v).map_or(Value::Int64(v), Value::Int32))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Value, E>
        where
            E: serde::de::Error,
        {
            let v = i64::try_from(v)
                .map_err(|_| E::custom("integer out of range for a document value"))?;
            Ok(i32::try_from(v).map_or(Value::Int64(v), Value::Int32))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Value::Double(v))
        }

        fn visit_str<E>(self, v: &str) -> Result<Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Value::String(v.into()))
        }

        fn visit_string<E>(self, v: String) -> Result<Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Value::String(v))
        }

        fn visit_bytes<E>(self, v: &[u8]) -> Result<Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Value::Binary(BString::from(v)))
        }

        fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Value::Binary(BString::from(v)))
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut items = Vec::new();
            while let Some(item) = seq.next_element()? {
                items.push(item);
            }
            Ok(Value::Array(items))
        }

        fn visit_map<A>(self, map: A) -> Result<Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            DocumentVisitor.visit_map(map).map(Value::Document)
        }
    }

    impl<'de> Deserialize<'de> for Value {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(ValueVisitor)
        }
    }

    struct DocumentVisitor;

    impl<'de> Visitor<'de> for DocumentVisitor {
        type Value = Document;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a document")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Document, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut document = Document::new();
            while let Some((key, value)) = map.next_entry::<String, Value>()? {
                document.insert(key, value);
            }
            Ok(document)
        }
    }

    impl<'de> Deserialize<'de> for Document {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(DocumentVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, string::ToString, vec};

    use super::*;

    #[test]
    fn insert_preserves_position_on_replace() {
        let mut document = Document::new();
        document.insert("a", 1i32);
        document.insert("b", 2i32);
        let old = document.insert("a", 3i32);
        assert_eq!(old, Some(Value::Int32(1)));
        let keys: vec::Vec<&str> = document.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(document.get("a"), Some(&Value::Int32(3)));
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let mut a = Document::new();
        a.insert("x", 1i32);
        a.insert("y", "two");
        let mut b = Document::new();
        b.insert("y", "two");
        b.insert("x", 1i32);
        assert_eq!(a, b);

        b.insert("z", true);
        assert_ne!(a, b);
    }

    #[test]
    fn doc_macro_builds_nested_fragments() {
        let document = crate::doc! {
            "name" => "simple string",
            "tags" => vec!["toto1", "toto1", "toto3"],
            "inner" => crate::doc! { "n" => 7i32 },
        };
        assert_eq!(
            document.get("tags"),
            Some(&Value::Array(vec![
                Value::String("toto1".into()),
                Value::String("toto1".into()),
                Value::String("toto3".into()),
            ]))
        );
        assert_eq!(
            document
                .get("inner")
                .and_then(Value::as_document)
                .and_then(|d| d.get("n")),
            Some(&Value::Int32(7))
        );
    }

    #[test]
    fn display_renders_json_like_text() {
        let document = crate::doc! {
            "s" => "a\"b",
            "n" => 3i32,
            "list" => vec![1i64, 2i64],
        };
        assert_eq!(
            document.to_string(),
            r#"{"s":"a\"b","n":3,"list":[1,2]}"#
        );
    }

    #[test]
    fn kind_reflects_stored_representation() {
        assert_eq!(Value::from(true).kind(), Kind::Bool);
        assert_eq!(Value::from(1i32).kind(), Kind::I32);
        assert_eq!(Value::from(1i64).kind(), Kind::I64);
        assert_eq!(Value::from(1.0f64).kind(), Kind::Double);
        assert_eq!(Value::from("x").kind(), Kind::Text);
        assert_eq!(Value::from(&b"\x00\xFF"[..]).kind(), Kind::Bytes);
        assert_eq!(Value::from(vec![1i32]).kind(), Kind::List);
        assert_eq!(Value::from(Document::new()).kind(), Kind::Struct);
    }

    #[test]
    fn binary_values_keep_arbitrary_bytes() {
        let bytes: vec::Vec<u8> = (0u8..=255).collect();
        let value = Value::from(&bytes[..]);
        assert_eq!(value.as_bytes(), Some(&bytes[..]));
        // Non-UTF-8 content must survive a Display round without panicking.
        let _ = format!("{value}");
    }
}
