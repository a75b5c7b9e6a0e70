//! The protocol event interface spoken between typed objects and adapters.
//!
//! A typed object serializes itself by walking its fields and emitting the
//! ordered event sequence through [`OutputProtocol`]; it deserializes itself
//! by pulling the mirror sequence out of an [`InputProtocol`]. The protocol
//! carries no schema of its own: which fields exist, in which order and with
//! which shapes is dictated entirely by the object layer.

use alloc::string::String;

use bstr::BString;

use crate::error::{BridgeError, Result};

/// Type code attached to fields and collection elements.
///
/// `Stop` is also reported as the element kind of an empty sequence, where a
/// schema-driven reader never consults it (the size is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// End-of-fields marker.
    Stop,
    /// Boolean.
    Bool,
    /// 8-bit signed integer (stored widened to 32 bits).
    I8,
    /// 16-bit signed integer (stored widened to 32 bits).
    I16,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 64-bit floating point.
    Double,
    /// UTF-8 text.
    Text,
    /// Opaque byte sequence.
    Bytes,
    /// Nested structure.
    Struct,
    /// String-keyed map.
    Map,
    /// Unordered collection, encoded positionally.
    Set,
    /// Ordered collection.
    List,
}

/// Message envelope kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Request expecting a reply.
    Call,
    /// Reply to a call.
    Reply,
    /// Transport-level failure report.
    Exception,
    /// Request expecting no reply.
    Oneway,
}

impl MessageKind {
    /// The wire code of this message kind.
    #[must_use]
    pub fn code(self) -> i8 {
        match self {
            MessageKind::Call => 1,
            MessageKind::Reply => 2,
            MessageKind::Exception => 3,
            MessageKind::Oneway => 4,
        }
    }
}

/// Identifies a message envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageIdent {
    /// Method name the message addresses.
    pub name: String,
    /// Envelope kind.
    pub kind: MessageKind,
    /// Sequence number correlating calls and replies.
    pub sequence: i32,
}

impl MessageIdent {
    /// Create a message identifier.
    pub fn new(name: impl Into<String>, kind: MessageKind, sequence: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            sequence,
        }
    }
}

/// Identifies a structure. The name is metadata only and is not stored in
/// the produced document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructIdent {
    /// Declared structure name.
    pub name: &'static str,
}

impl StructIdent {
    /// Create a structure identifier.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

/// Identifies a field within a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIdent {
    /// Field name; becomes the document key.
    pub name: String,
    /// Kind of the field's value.
    pub kind: Kind,
    /// Numeric field id, when the writer knows one. Documents store fields
    /// by name, so replayed fields carry `None`.
    pub id: Option<i16>,
}

impl FieldIdent {
    /// Create a field identifier.
    pub fn new<N, I>(name: N, kind: Kind, id: I) -> Self
    where
        N: Into<String>,
        I: Into<Option<i16>>,
    {
        Self {
            name: name.into(),
            kind,
            id: id.into(),
        }
    }
}

/// Identifies a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListIdent {
    /// Element kind.
    pub element: Kind,
    /// Number of elements.
    pub size: usize,
}

impl ListIdent {
    /// Create a list identifier.
    #[must_use]
    pub fn new(element: Kind, size: usize) -> Self {
        Self { element, size }
    }
}

/// Identifies a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetIdent {
    /// Element kind.
    pub element: Kind,
    /// Number of elements.
    pub size: usize,
}

impl SetIdent {
    /// Create a set identifier.
    #[must_use]
    pub fn new(element: Kind, size: usize) -> Self {
        Self { element, size }
    }
}

/// Identifies a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapIdent {
    /// Key kind.
    pub key: Kind,
    /// Value kind.
    pub value: Kind,
    /// Number of entries.
    pub size: usize,
}

impl MapIdent {
    /// Create a map identifier.
    #[must_use]
    pub fn new(key: Kind, value: Kind, size: usize) -> Self {
        Self { key, value, size }
    }
}

/// Receiving end of the event stream: a typed object writes itself into an
/// implementation of this trait.
///
/// Scope-opening and scope-closing calls must be balanced and properly
/// nested; primitive writes land in the innermost open scope. Violations are
/// reported as [`BridgeError::InvalidState`].
pub trait OutputProtocol {
    /// Open a message envelope. The envelope is transport framing and is not
    /// part of any produced document.
    fn write_message_begin(&mut self, ident: &MessageIdent) -> Result<()>;
    /// Close the message envelope.
    fn write_message_end(&mut self) -> Result<()>;
    /// Open a structure scope.
    fn write_struct_begin(&mut self, ident: &StructIdent) -> Result<()>;
    /// Close the innermost structure scope.
    fn write_struct_end(&mut self) -> Result<()>;
    /// Open a field scope within the enclosing structure.
    fn write_field_begin(&mut self, ident: &FieldIdent) -> Result<()>;
    /// Close the innermost field scope, attaching its value.
    fn write_field_end(&mut self) -> Result<()>;
    /// Signal that no more fields follow. Carries no data.
    fn write_field_stop(&mut self) -> Result<()>;
    /// Open a map scope.
    fn write_map_begin(&mut self, ident: &MapIdent) -> Result<()>;
    /// Close the innermost map scope.
    fn write_map_end(&mut self) -> Result<()>;
    /// Open a list scope.
    fn write_list_begin(&mut self, ident: &ListIdent) -> Result<()>;
    /// Close the innermost list scope.
    fn write_list_end(&mut self) -> Result<()>;
    /// Open a set scope.
    fn write_set_begin(&mut self, ident: &SetIdent) -> Result<()>;
    /// Close the innermost set scope.
    fn write_set_end(&mut self) -> Result<()>;
    /// Write a boolean into the innermost open scope.
    fn write_bool(&mut self, value: bool) -> Result<()>;
    /// Write an 8-bit integer. Stored widened to 32 bits.
    fn write_i8(&mut self, value: i8) -> Result<()>;
    /// Write a 16-bit integer. Stored widened to 32 bits.
    fn write_i16(&mut self, value: i16) -> Result<()>;
    /// Write a 32-bit integer.
    fn write_i32(&mut self, value: i32) -> Result<()>;
    /// Write a 64-bit integer.
    fn write_i64(&mut self, value: i64) -> Result<()>;
    /// Write a 64-bit float.
    fn write_double(&mut self, value: f64) -> Result<()>;
    /// Write a text value.
    fn write_string(&mut self, value: &str) -> Result<()>;
    /// Write a byte sequence.
    fn write_binary(&mut self, value: &[u8]) -> Result<()>;
}

/// Producing end of the event stream: a typed object reads itself out of an
/// implementation of this trait.
pub trait InputProtocol {
    /// Read a message envelope, when the underlying source carries one.
    fn read_message_begin(&mut self) -> Result<MessageIdent>;
    /// Finish reading a message envelope.
    fn read_message_end(&mut self) -> Result<()>;
    /// Open the next structure for reading.
    fn read_struct_begin(&mut self) -> Result<()>;
    /// Finish reading the innermost structure.
    fn read_struct_end(&mut self) -> Result<()>;
    /// Read the next field header, or `None` once all fields of the
    /// innermost structure have been delivered.
    fn read_field_begin(&mut self) -> Result<Option<FieldIdent>>;
    /// Finish reading the current field. Any unconsumed field value is
    /// dropped, so callers may decline a field simply by not reading it.
    fn read_field_end(&mut self) -> Result<()>;
    /// Open the next map for reading.
    fn read_map_begin(&mut self) -> Result<MapIdent>;
    /// Finish reading the innermost map.
    fn read_map_end(&mut self) -> Result<()>;
    /// Open the next list for reading.
    fn read_list_begin(&mut self) -> Result<ListIdent>;
    /// Finish reading the innermost list.
    fn read_list_end(&mut self) -> Result<()>;
    /// Open the next set for reading.
    fn read_set_begin(&mut self) -> Result<SetIdent>;
    /// Finish reading the innermost set.
    fn read_set_end(&mut self) -> Result<()>;
    /// Read a boolean.
    fn read_bool(&mut self) -> Result<bool>;
    /// Read an 8-bit integer, range-checked.
    fn read_i8(&mut self) -> Result<i8>;
    /// Read a 16-bit integer, range-checked.
    fn read_i16(&mut self) -> Result<i16>;
    /// Read a 32-bit integer, range-checked.
    fn read_i32(&mut self) -> Result<i32>;
    /// Read a 64-bit integer.
    fn read_i64(&mut self) -> Result<i64>;
    /// Read a 64-bit float.
    fn read_double(&mut self) -> Result<f64>;
    /// Read a text value.
    fn read_string(&mut self) -> Result<String>;
    /// Read a byte sequence.
    fn read_binary(&mut self) -> Result<BString>;

    /// Consume and discard one value of the given kind, recursing through
    /// nested containers.
    ///
    /// This is how schema-driven readers tolerate fields they do not know:
    /// on an unrecognized field header, skip its kind and move on.
    fn skip(&mut self, kind: Kind) -> Result<()> {
        match kind {
            Kind::Stop => Err(BridgeError::InvalidState("cannot skip a stop marker")),
            Kind::Bool => self.read_bool().map(drop),
            Kind::I8 => self.read_i8().map(drop),
            Kind::I16 => self.read_i16().map(drop),
            Kind::I32 => self.read_i32().map(drop),
            Kind::I64 => self.read_i64().map(drop),
            Kind::Double => self.read_double().map(drop),
            Kind::Text => self.read_string().map(drop),
            Kind::Bytes => self.read_binary().map(drop),
            Kind::Struct => {
                self.read_struct_begin()?;
                while let Some(field) = self.read_field_begin()? {
                    self.skip(field.kind)?;
                    self.read_field_end()?;
                }
                self.read_struct_end()
            }
            Kind::Map => {
                let ident = self.read_map_begin()?;
                for _ in 0..ident.size {
                    self.skip(ident.key)?;
                    self.skip(ident.value)?;
                }
                self.read_map_end()
            }
            Kind::Set => {
                let ident = self.read_set_begin()?;
                for _ in 0..ident.size {
                    self.skip(ident.element)?;
                }
                self.read_set_end()
            }
            Kind::List => {
                let ident = self.read_list_begin()?;
                for _ in 0..ident.size {
                    self.skip(ident.element)?;
                }
                self.read_list_end()
            }
        }
    }
}

/// The seam to the code-generated typed-object layer.
///
/// Implementations emit their full ordered event sequence in `write_to` and
/// consume the mirror sequence in `read_from`. The adapter has no knowledge
/// of the schema; the record is the schema authority.
pub trait Record {
    /// Serialize this record by emitting protocol events.
    fn write_to(&self, protocol: &mut dyn OutputProtocol) -> Result<()>;
    /// Populate this record by consuming protocol events.
    fn read_from(&mut self, protocol: &mut dyn InputProtocol) -> Result<()>;
}
