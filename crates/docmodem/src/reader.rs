//! Decode-direction protocol adapter: replays a stored [`Document`] as the
//! ordered event stream a typed object's own decode logic expects.
//!
//! Each open container keeps an iteration cursor over its children (entry
//! order for structs and maps, element order for sequences), so a document
//! always replays in the same deterministic order it was built in. Keys the
//! consuming object does not recognize are simply skipped; the protocol is
//! schema-agnostic and the object layer is the schema authority.

use alloc::{borrow::ToOwned, string::String, vec::Vec};

use bstr::BString;

use crate::{
    error::{BridgeError, Result},
    options::BridgeOptions,
    protocol::{
        FieldIdent, InputProtocol, Kind, ListIdent, MapIdent, MessageIdent, SetIdent,
    },
    value::{Document, Value},
    writer::SequenceKind,
};

/// Cursor over one open container.
#[derive(Debug)]
enum ReadFrame<'a> {
    /// Iterates entries; `pending` is armed by `read_field_begin` and holds
    /// the value the next primitive or container read pulls from.
    Struct {
        doc: &'a Document,
        index: usize,
        pending: Option<&'a Value>,
    },
    /// Iterates elements in order.
    Sequence {
        kind: SequenceKind,
        items: &'a [Value],
        index: usize,
    },
    /// Iterates entries, alternating between the key and the value half.
    Map {
        doc: &'a Document,
        index: usize,
        at_value: bool,
    },
}

/// Where the next read resolves to: a stored value, or the key half of a map
/// entry (keys live outside the value model).
enum Slot<'a> {
    Value(&'a Value),
    Key(&'a str),
}

/// Replays a borrowed [`Document`] through the [`InputProtocol`] surface.
///
/// A reader is constructed per deserialize call and borrows the source
/// document for its whole lifetime, so there is no state to reset and
/// nothing shared between calls.
#[derive(Debug)]
pub struct DocumentReader<'a> {
    root: &'a Document,
    options: BridgeOptions,
    stack: Vec<ReadFrame<'a>>,
}

impl<'a> DocumentReader<'a> {
    /// Create a reader over `document` with default options.
    #[must_use]
    pub fn new(document: &'a Document) -> Self {
        Self::with_options(document, BridgeOptions::default())
    }

    /// Create a reader over `document` with the given options.
    #[must_use]
    pub fn with_options(document: &'a Document, options: BridgeOptions) -> Self {
        Self {
            root: document,
            options,
            stack: Vec::new(),
        }
    }

    /// Pull the next value (or map-entry key) out of the innermost cursor.
    fn next_slot(&mut self) -> Result<Slot<'a>> {
        match self.stack.last_mut() {
            None => Err(BridgeError::InvalidState("read with no open scope")),
            Some(ReadFrame::Struct { pending, .. }) => pending
                .take()
                .map(Slot::Value)
                .ok_or(BridgeError::InvalidState(
                    "field value read before read_field_begin armed one",
                )),
            Some(ReadFrame::Sequence { items, index, .. }) => {
                let items: &'a [Value] = *items;
                match items.get(*index) {
                    Some(value) => {
                        *index += 1;
                        Ok(Slot::Value(value))
                    }
                    None => Err(BridgeError::InvalidState("read past the end of an array")),
                }
            }
            Some(ReadFrame::Map {
                doc,
                index,
                at_value,
            }) => {
                let doc: &'a Document = *doc;
                let (key, value) = doc
                    .get_index(*index)
                    .ok_or(BridgeError::InvalidState("read past the end of a map"))?;
                if *at_value {
                    *at_value = false;
                    *index += 1;
                    Ok(Slot::Value(value))
                } else {
                    *at_value = true;
                    Ok(Slot::Key(key))
                }
            }
        }
    }

    /// Like [`next_slot`](Self::next_slot), for reads that cannot be
    /// satisfied by a map key.
    fn next_value(&mut self, expected: &'static str) -> Result<&'a Value> {
        match self.next_slot()? {
            Slot::Value(value) => Ok(value),
            Slot::Key(_) => Err(BridgeError::UnexpectedKind {
                expected,
                found: Kind::Text,
            }),
        }
    }

    /// Integer reads share one width-agnostic pull; the callers narrow.
    fn next_integer(&mut self, expected: &'static str) -> Result<i64> {
        match self.next_slot()? {
            Slot::Value(Value::Int32(v)) => Ok((*v).into()),
            Slot::Value(Value::Int64(v)) => Ok(*v),
            Slot::Value(other) => Err(BridgeError::UnexpectedKind {
                expected,
                found: other.kind(),
            }),
            Slot::Key(key) if self.options.stringify_map_keys => {
                key.parse().map_err(|_| BridgeError::UnexpectedKind {
                    expected,
                    found: Kind::Text,
                })
            }
            Slot::Key(_) => Err(BridgeError::UnexpectedKind {
                expected,
                found: Kind::Text,
            }),
        }
    }

    fn push_sequence(&mut self, kind: SequenceKind, expected: &'static str) -> Result<(Kind, usize)> {
        match self.next_value(expected)? {
            Value::Array(items) => {
                let element = items.first().map_or(Kind::Stop, Value::kind);
                let size = items.len();
                self.stack.push(ReadFrame::Sequence {
                    kind,
                    items: items.as_slice(),
                    index: 0,
                });
                Ok((element, size))
            }
            other => Err(BridgeError::UnexpectedKind {
                expected,
                found: other.kind(),
            }),
        }
    }

    fn pop(&mut self) -> Result<ReadFrame<'a>> {
        self.stack
            .pop()
            .ok_or(BridgeError::InvalidState("close event with no open scope"))
    }
}

impl<'a> InputProtocol for DocumentReader<'a> {
    fn read_message_begin(&mut self) -> Result<MessageIdent> {
        // Messages are transport framing; a stored document has none.
        Err(BridgeError::InvalidState(
            "documents carry no message envelope",
        ))
    }

    fn read_message_end(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_struct_begin(&mut self) -> Result<()> {
        let doc = if self.stack.is_empty() {
            self.root
        } else {
            match self.next_value("a nested document")? {
                Value::Document(doc) => doc,
                other => {
                    return Err(BridgeError::UnexpectedKind {
                        expected: "a nested document",
                        found: other.kind(),
                    });
                }
            }
        };
        self.stack.push(ReadFrame::Struct {
            doc,
            index: 0,
            pending: None,
        });
        Ok(())
    }

    fn read_struct_end(&mut self) -> Result<()> {
        match self.pop()? {
            // Entries the caller never asked about are dropped here; unknown
            // keys must not fail the read.
            ReadFrame::Struct { .. } => Ok(()),
            _ => Err(BridgeError::InvalidState(
                "struct end does not match the open scope",
            )),
        }
    }

    fn read_field_begin(&mut self) -> Result<Option<FieldIdent>> {
        match self.stack.last_mut() {
            Some(ReadFrame::Struct {
                doc,
                index,
                pending,
            }) => {
                let doc: &'a Document = *doc;
                match doc.get_index(*index) {
                    Some((name, value)) => {
                        *index += 1;
                        *pending = Some(value);
                        Ok(Some(FieldIdent::new(name, value.kind(), None)))
                    }
                    None => Ok(None),
                }
            }
            _ => Err(BridgeError::InvalidState("field read outside of a struct")),
        }
    }

    fn read_field_end(&mut self) -> Result<()> {
        match self.stack.last_mut() {
            Some(ReadFrame::Struct { pending, .. }) => {
                *pending = None;
                Ok(())
            }
            _ => Err(BridgeError::InvalidState("field end outside of a struct")),
        }
    }

    fn read_map_begin(&mut self) -> Result<MapIdent> {
        match self.next_value("a stored map")? {
            Value::Document(doc) => {
                let value = doc.get_index(0).map_or(Kind::Stop, |(_, v)| v.kind());
                let size = doc.len();
                self.stack.push(ReadFrame::Map {
                    doc,
                    index: 0,
                    at_value: false,
                });
                Ok(MapIdent::new(Kind::Text, value, size))
            }
            other => Err(BridgeError::UnexpectedKind {
                expected: "a stored map",
                found: other.kind(),
            }),
        }
    }

    fn read_map_end(&mut self) -> Result<()> {
        match self.pop()? {
            ReadFrame::Map { .. } => Ok(()),
            _ => Err(BridgeError::InvalidState(
                "map end does not match the open scope",
            )),
        }
    }

    fn read_list_begin(&mut self) -> Result<ListIdent> {
        let (element, size) = self.push_sequence(SequenceKind::List, "a stored list")?;
        Ok(ListIdent::new(element, size))
    }

    fn read_list_end(&mut self) -> Result<()> {
        match self.pop()? {
            ReadFrame::Sequence {
                kind: SequenceKind::List,
                ..
            } => Ok(()),
            _ => Err(BridgeError::InvalidState(
                "list end does not match the open scope",
            )),
        }
    }

    fn read_set_begin(&mut self) -> Result<SetIdent> {
        let (element, size) = self.push_sequence(SequenceKind::Set, "a stored set")?;
        Ok(SetIdent::new(element, size))
    }

    fn read_set_end(&mut self) -> Result<()> {
        match self.pop()? {
            ReadFrame::Sequence {
                kind: SequenceKind::Set,
                ..
            } => Ok(()),
            _ => Err(BridgeError::InvalidState(
                "set end does not match the open scope",
            )),
        }
    }

    fn read_bool(&mut self) -> Result<bool> {
        match self.next_value("a boolean")? {
            Value::Boolean(b) => Ok(*b),
            // The historical bridge wrote booleans through its byte path;
            // documents it produced store 0/1 integers.
            Value::Int32(0) => Ok(false),
            Value::Int32(1) => Ok(true),
            other => Err(BridgeError::UnexpectedKind {
                expected: "a boolean",
                found: other.kind(),
            }),
        }
    }

    fn read_i8(&mut self) -> Result<i8> {
        let value = self.next_integer("an 8-bit integer")?;
        i8::try_from(value).map_err(|_| BridgeError::OutOfRange {
            expected: "an 8-bit integer",
            value,
        })
    }

    fn read_i16(&mut self) -> Result<i16> {
        let value = self.next_integer("a 16-bit integer")?;
        i16::try_from(value).map_err(|_| BridgeError::OutOfRange {
            expected: "a 16-bit integer",
            value,
        })
    }

    fn read_i32(&mut self) -> Result<i32> {
        let value = self.next_integer("a 32-bit integer")?;
        i32::try_from(value).map_err(|_| BridgeError::OutOfRange {
            expected: "a 32-bit integer",
            value,
        })
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.next_integer("a 64-bit integer")
    }

    fn read_double(&mut self) -> Result<f64> {
        match self.next_value("a double")? {
            Value::Double(v) => Ok(*v),
            other => Err(BridgeError::UnexpectedKind {
                expected: "a double",
                found: other.kind(),
            }),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        match self.next_slot()? {
            Slot::Value(Value::String(s)) => Ok(s.clone()),
            Slot::Value(other) => Err(BridgeError::UnexpectedKind {
                expected: "text",
                found: other.kind(),
            }),
            Slot::Key(key) => Ok(key.to_owned()),
        }
    }

    fn read_binary(&mut self) -> Result<BString> {
        match self.next_value("binary data")? {
            Value::Binary(b) => Ok(b.clone()),
            // Documents written by the historical bridge stored binary
            // fields as text; keep them readable.
            Value::String(s) => Ok(BString::from(s.as_str())),
            other => Err(BridgeError::UnexpectedKind {
                expected: "binary data",
                found: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::doc;

    #[test]
    fn replays_scalar_and_list_fields_in_insertion_order() {
        let document = doc! {
            "name" => "simple string",
            "tags" => vec!["toto1", "toto1", "toto3"],
        };
        let mut r = DocumentReader::new(&document);
        r.read_struct_begin().unwrap();

        let field = r.read_field_begin().unwrap().unwrap();
        assert_eq!(field.name, "name");
        assert_eq!(field.kind, Kind::Text);
        assert_eq!(r.read_string().unwrap(), "simple string");
        r.read_field_end().unwrap();

        let field = r.read_field_begin().unwrap().unwrap();
        assert_eq!(field.name, "tags");
        assert_eq!(field.kind, Kind::List);
        let list = r.read_list_begin().unwrap();
        assert_eq!((list.element, list.size), (Kind::Text, 3));
        assert_eq!(r.read_string().unwrap(), "toto1");
        assert_eq!(r.read_string().unwrap(), "toto1");
        assert_eq!(r.read_string().unwrap(), "toto3");
        r.read_list_end().unwrap();
        r.read_field_end().unwrap();

        assert!(r.read_field_begin().unwrap().is_none());
        r.read_struct_end().unwrap();
    }

    #[test]
    fn replays_nested_documents_and_maps() {
        let document = doc! {
            "author" => doc! { "name" => "str1", "born" => 1931i32 },
            "codes" => doc! { "key1" => "value1", "key2" => "value2" },
        };
        let mut r = DocumentReader::new(&document);
        r.read_struct_begin().unwrap();

        assert_eq!(r.read_field_begin().unwrap().unwrap().name, "author");
        r.read_struct_begin().unwrap();
        assert_eq!(r.read_field_begin().unwrap().unwrap().name, "name");
        assert_eq!(r.read_string().unwrap(), "str1");
        r.read_field_end().unwrap();
        assert_eq!(r.read_field_begin().unwrap().unwrap().name, "born");
        assert_eq!(r.read_i32().unwrap(), 1931);
        r.read_field_end().unwrap();
        assert!(r.read_field_begin().unwrap().is_none());
        r.read_struct_end().unwrap();
        r.read_field_end().unwrap();

        assert_eq!(r.read_field_begin().unwrap().unwrap().name, "codes");
        let map = r.read_map_begin().unwrap();
        assert_eq!((map.key, map.value, map.size), (Kind::Text, Kind::Text, 2));
        assert_eq!(r.read_string().unwrap(), "key1");
        assert_eq!(r.read_string().unwrap(), "value1");
        assert_eq!(r.read_string().unwrap(), "key2");
        assert_eq!(r.read_string().unwrap(), "value2");
        r.read_map_end().unwrap();
        r.read_field_end().unwrap();

        assert!(r.read_field_begin().unwrap().is_none());
        r.read_struct_end().unwrap();
    }

    #[test]
    fn unknown_fields_skip_cleanly() {
        let document = doc! {
            "junk_scalar" => 9i32,
            "junk_nested" => doc! { "deep" => vec![doc! { "x" => 1i32 }] },
            "wanted" => "kept",
        };
        let mut r = DocumentReader::new(&document);
        r.read_struct_begin().unwrap();

        let mut wanted = None;
        while let Some(field) = r.read_field_begin().unwrap() {
            if field.name == "wanted" {
                wanted = Some(r.read_string().unwrap());
            } else {
                r.skip(field.kind).unwrap();
            }
            r.read_field_end().unwrap();
        }
        r.read_struct_end().unwrap();
        assert_eq!(wanted.as_deref(), Some("kept"));
    }

    #[test]
    fn unread_field_values_may_be_dropped_implicitly() {
        let document = doc! { "ignored" => 1i32, "kept" => 2i32 };
        let mut r = DocumentReader::new(&document);
        r.read_struct_begin().unwrap();
        // Decline the first field without an explicit skip.
        assert_eq!(r.read_field_begin().unwrap().unwrap().name, "ignored");
        r.read_field_end().unwrap();
        assert_eq!(r.read_field_begin().unwrap().unwrap().name, "kept");
        assert_eq!(r.read_i32().unwrap(), 2);
        r.read_field_end().unwrap();
        assert!(r.read_field_begin().unwrap().is_none());
        r.read_struct_end().unwrap();
    }

    #[test]
    fn empty_sequences_report_stop_elements() {
        let document = doc! { "tags" => Vec::<Value>::new() };
        let mut r = DocumentReader::new(&document);
        r.read_struct_begin().unwrap();
        r.read_field_begin().unwrap().unwrap();
        let list = r.read_list_begin().unwrap();
        assert_eq!((list.element, list.size), (Kind::Stop, 0));
        r.read_list_end().unwrap();
        r.read_field_end().unwrap();
        r.read_struct_end().unwrap();
    }

    #[test]
    fn legacy_integer_booleans_read_back() {
        let document = doc! { "archived" => 1i32, "hidden" => 0i32 };
        let mut r = DocumentReader::new(&document);
        r.read_struct_begin().unwrap();
        r.read_field_begin().unwrap().unwrap();
        assert!(r.read_bool().unwrap());
        r.read_field_end().unwrap();
        r.read_field_begin().unwrap().unwrap();
        assert!(!r.read_bool().unwrap());
        r.read_field_end().unwrap();
        r.read_struct_end().unwrap();
    }

    #[test]
    fn legacy_text_satisfies_binary_reads() {
        let document = doc! { "cover" => "plain text" };
        let mut r = DocumentReader::new(&document);
        r.read_struct_begin().unwrap();
        r.read_field_begin().unwrap().unwrap();
        assert_eq!(r.read_binary().unwrap(), BString::from("plain text"));
        r.read_field_end().unwrap();
        r.read_struct_end().unwrap();
    }

    #[test]
    fn stringified_map_keys_parse_back_on_request() {
        let document = doc! { "scores" => doc! { "5" => 10i32 } };
        let mut r = DocumentReader::with_options(
            &document,
            BridgeOptions {
                stringify_map_keys: true,
                ..Default::default()
            },
        );
        r.read_struct_begin().unwrap();
        r.read_field_begin().unwrap().unwrap();
        let map = r.read_map_begin().unwrap();
        assert_eq!(map.size, 1);
        assert_eq!(r.read_i32().unwrap(), 5);
        assert_eq!(r.read_i32().unwrap(), 10);
        r.read_map_end().unwrap();
        r.read_field_end().unwrap();
        r.read_struct_end().unwrap();
    }

    #[test]
    fn narrowing_reads_are_range_checked() {
        let document = doc! { "flags" => 300i32 };
        let mut r = DocumentReader::new(&document);
        r.read_struct_begin().unwrap();
        r.read_field_begin().unwrap().unwrap();
        assert_eq!(
            r.read_i8(),
            Err(BridgeError::OutOfRange {
                expected: "an 8-bit integer",
                value: 300,
            })
        );
    }

    #[test]
    fn int32_widens_for_i64_reads() {
        let document = doc! { "copies" => 42i32 };
        let mut r = DocumentReader::new(&document);
        r.read_struct_begin().unwrap();
        r.read_field_begin().unwrap().unwrap();
        assert_eq!(r.read_i64().unwrap(), 42);
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let document = doc! { "name" => "text" };
        let mut r = DocumentReader::new(&document);
        r.read_struct_begin().unwrap();
        r.read_field_begin().unwrap().unwrap();
        assert_eq!(
            r.read_double(),
            Err(BridgeError::UnexpectedKind {
                expected: "a double",
                found: Kind::Text,
            })
        );
    }

    #[test]
    fn reads_outside_any_scope_are_invalid_state() {
        let document = doc! {};
        let mut r = DocumentReader::new(&document);
        assert!(matches!(
            r.read_i32(),
            Err(BridgeError::InvalidState(_))
        ));
    }

    #[test]
    fn message_replay_is_refused() {
        let document = doc! {};
        let mut r = DocumentReader::new(&document);
        assert!(matches!(
            r.read_message_begin(),
            Err(BridgeError::InvalidState(_))
        ));
    }

    #[test]
    fn reading_past_an_array_end_is_invalid_state() {
        let document = doc! { "tags" => vec!["only"] };
        let mut r = DocumentReader::new(&document);
        r.read_struct_begin().unwrap();
        r.read_field_begin().unwrap().unwrap();
        r.read_list_begin().unwrap();
        r.read_string().unwrap();
        assert!(matches!(
            r.read_string(),
            Err(BridgeError::InvalidState(_))
        ));
    }
}
