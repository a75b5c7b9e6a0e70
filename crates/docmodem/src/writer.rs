//! Encode-direction protocol adapter: folds the event stream into a
//! [`Document`].
//!
//! The raw events carry no parent-child linkage, only an implicit stack
//! discipline, so the adapter keeps a stack of partially-built fragments and
//! merges them as scope-closing events arrive.

#![allow(clippy::enum_glob_use)]

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use bstr::BString;

use crate::{
    error::{BridgeError, Result},
    options::BridgeOptions,
    protocol::{
        FieldIdent, Kind, ListIdent, MapIdent, MessageIdent, OutputProtocol, SetIdent, StructIdent,
    },
    value::{Array, Document, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SequenceKind {
    List,
    Set,
}

/// One open scope. Each variant defines its own behavior for receiving a
/// value, which is the only operation the stack dispatches polymorphically.
#[derive(Debug)]
enum WriteContext {
    /// Transport envelope; collects the positional name/kind/sequence writes
    /// and is discarded on close.
    Message { items: Array },
    /// Accumulates child fields into a document fragment. Never receives a
    /// value directly.
    Struct { doc: Document },
    /// Holds at most one pending value between begin and end.
    Field { name: String, value: Option<Value> },
    /// Appends values in write order.
    Sequence { kind: SequenceKind, items: Array },
    /// Alternates between a pending key and its value.
    Map {
        doc: Document,
        pending_key: Option<String>,
    },
}

/// Receives protocol events and builds one finished [`Document`] per
/// top-level structure.
///
/// A writer owns its context stack and finished-document slot outright; one
/// writer per in-flight serialize call needs no synchronization of any kind.
/// After an error the stack may hold half-built fragments; call [`reset`]
/// (or drop the writer) before reusing it.
///
/// [`reset`]: DocumentWriter::reset
#[derive(Debug, Default)]
pub struct DocumentWriter {
    options: BridgeOptions,
    stack: Vec<WriteContext>,
    root: Option<Document>,
}

impl DocumentWriter {
    /// Create a writer with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(BridgeOptions::default())
    }

    /// Create a writer with the given options.
    #[must_use]
    pub fn with_options(options: BridgeOptions) -> Self {
        Self {
            options,
            stack: Vec::new(),
            root: None,
        }
    }

    /// Take the finished document, re-arming the writer for another
    /// serialize call.
    ///
    /// Fails with an invalid-state error when scopes are still open or no
    /// top-level structure was closed; either way the writer is reset, so no
    /// state leaks into the next call.
    pub fn take_document(&mut self) -> Result<Document> {
        if !self.stack.is_empty() {
            self.reset();
            return Err(BridgeError::InvalidState(
                "document taken while scopes are still open",
            ));
        }
        self.root
            .take()
            .ok_or(BridgeError::InvalidState("no document was produced"))
    }

    /// Consuming variant of [`take_document`](DocumentWriter::take_document).
    pub fn into_document(mut self) -> Result<Document> {
        self.take_document()
    }

    /// Clear the context stack and the finished-document slot.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.root = None;
    }

    /// Route a value into the innermost open scope.
    fn add_value(&mut self, value: Value) -> Result<()> {
        use WriteContext::*;
        let options = self.options;
        match self.stack.last_mut() {
            None => Err(BridgeError::InvalidState(
                "value written with no open scope",
            )),
            Some(Message { items } | Sequence { items, .. }) => {
                items.push(value);
                Ok(())
            }
            Some(Field { value: slot, .. }) => {
                // A field holds exactly one value; a later write replaces an
                // earlier one.
                *slot = Some(value);
                Ok(())
            }
            Some(Map { doc, pending_key }) => match pending_key.take() {
                Some(key) => {
                    doc.insert(key, value);
                    Ok(())
                }
                None => {
                    *pending_key = Some(map_key(value, options)?);
                    Ok(())
                }
            },
            Some(Struct { .. }) => Err(BridgeError::InvalidState(
                "value written directly into a struct; values reach a struct through fields",
            )),
        }
    }

    fn pop(&mut self) -> Result<WriteContext> {
        self.stack
            .pop()
            .ok_or(BridgeError::InvalidState("close event with no open scope"))
    }

    /// Fold a finished struct or map fragment into its parent, or publish it
    /// as the result when it is the outermost document scope.
    fn close_document(&mut self, doc: Document) -> Result<()> {
        match self.stack.last() {
            // A struct directly inside the envelope (or with nothing below
            // it) is the document this serialize call produces.
            None | Some(WriteContext::Message { .. }) => {
                self.root = Some(doc);
                Ok(())
            }
            Some(_) => self.add_value(Value::Document(doc)),
        }
    }
}

/// Coerce a written value into a document key.
fn map_key(value: Value, options: BridgeOptions) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Int32(v) if options.stringify_map_keys => Ok(v.to_string()),
        Value::Int64(v) if options.stringify_map_keys => Ok(v.to_string()),
        other => Err(BridgeError::UnsupportedKeyType { kind: other.kind() }),
    }
}

impl OutputProtocol for DocumentWriter {
    fn write_message_begin(&mut self, ident: &MessageIdent) -> Result<()> {
        self.stack.push(WriteContext::Message { items: Array::new() });
        // Messages are encoded positionally: name, kind code, sequence id.
        self.write_string(&ident.name)?;
        self.write_i8(ident.kind.code())?;
        self.write_i32(ident.sequence)
    }

    fn write_message_end(&mut self) -> Result<()> {
        match self.pop()? {
            WriteContext::Message { .. } => Ok(()),
            _ => Err(BridgeError::InvalidState(
                "message end does not match the open scope",
            )),
        }
    }

    fn write_struct_begin(&mut self, _ident: &StructIdent) -> Result<()> {
        self.stack.push(WriteContext::Struct {
            doc: Document::new(),
        });
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<()> {
        match self.pop()? {
            WriteContext::Struct { doc } => self.close_document(doc),
            _ => Err(BridgeError::InvalidState(
                "struct end does not match the open scope",
            )),
        }
    }

    fn write_field_begin(&mut self, ident: &FieldIdent) -> Result<()> {
        match self.stack.last() {
            Some(WriteContext::Struct { .. }) => {
                self.stack.push(WriteContext::Field {
                    name: ident.name.clone(),
                    value: None,
                });
                Ok(())
            }
            _ => Err(BridgeError::InvalidState(
                "field begun outside of a struct",
            )),
        }
    }

    fn write_field_end(&mut self) -> Result<()> {
        let (name, value) = match self.pop()? {
            WriteContext::Field { name, value } => (name, value),
            _ => {
                return Err(BridgeError::InvalidState(
                    "field end does not match the open scope",
                ));
            }
        };
        let value = value.ok_or(BridgeError::InvalidState(
            "field closed before any value was written",
        ))?;
        match self.stack.last_mut() {
            Some(WriteContext::Struct { doc }) => {
                doc.insert(name, value);
                Ok(())
            }
            _ => Err(BridgeError::InvalidState("field closed outside of a struct")),
        }
    }

    fn write_field_stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_map_begin(&mut self, _ident: &MapIdent) -> Result<()> {
        self.stack.push(WriteContext::Map {
            doc: Document::new(),
            pending_key: None,
        });
        Ok(())
    }

    fn write_map_end(&mut self) -> Result<()> {
        match self.pop()? {
            WriteContext::Map {
                pending_key: Some(_),
                ..
            } => Err(BridgeError::InvalidState(
                "map closed between a key and its value",
            )),
            WriteContext::Map {
                doc,
                pending_key: None,
            } => self.close_document(doc),
            _ => Err(BridgeError::InvalidState(
                "map end does not match the open scope",
            )),
        }
    }

    fn write_list_begin(&mut self, _ident: &ListIdent) -> Result<()> {
        self.stack.push(WriteContext::Sequence {
            kind: SequenceKind::List,
            items: Array::new(),
        });
        Ok(())
    }

    fn write_list_end(&mut self) -> Result<()> {
        match self.pop()? {
            WriteContext::Sequence {
                kind: SequenceKind::List,
                items,
            } => {
                // An array has no name of its own: hand it to the scope that
                // is waiting for it (typically a field or a map entry).
                self.add_value(Value::Array(items))
            }
            _ => Err(BridgeError::InvalidState(
                "list end does not match the open scope",
            )),
        }
    }

    fn write_set_begin(&mut self, _ident: &SetIdent) -> Result<()> {
        self.stack.push(WriteContext::Sequence {
            kind: SequenceKind::Set,
            items: Array::new(),
        });
        Ok(())
    }

    fn write_set_end(&mut self) -> Result<()> {
        match self.pop()? {
            WriteContext::Sequence {
                kind: SequenceKind::Set,
                items,
            } => self.add_value(Value::Array(items)),
            _ => Err(BridgeError::InvalidState(
                "set end does not match the open scope",
            )),
        }
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.add_value(Value::Boolean(value))
    }

    fn write_i8(&mut self, value: i8) -> Result<()> {
        self.add_value(Value::Int32(value.into()))
    }

    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.add_value(Value::Int32(value.into()))
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.add_value(Value::Int32(value))
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.add_value(Value::Int64(value))
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        self.add_value(Value::Double(value))
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.add_value(Value::String(value.into()))
    }

    fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        if self.options.text_binary {
            let text = core::str::from_utf8(value)?;
            self.add_value(Value::String(text.into()))
        } else {
            self.add_value(Value::Binary(BString::from(value)))
        }
    }
}
