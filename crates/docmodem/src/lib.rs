//! Bridges a Thrift-style protocol event stream to an in-memory hierarchical
//! document model.
//!
//! A typed object serializes itself by emitting begin/end events for
//! structures, fields, lists, sets and maps plus primitive writes; the
//! [`DocumentWriter`] consumes that stream over a stack of partially-built
//! fragments and folds it into one nested [`Document`]. The
//! [`DocumentReader`] performs the inverse: it replays a stored document as
//! the mirror event stream so the object's own decode logic can reconstruct
//! it without ever touching the document model.
//!
//! ```
//! use docmodem::{
//!     BridgeError, FieldIdent, InputProtocol, Kind, ListIdent, OutputProtocol, Record,
//!     StructIdent, doc, from_document, to_document,
//! };
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Beacon {
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! impl Record for Beacon {
//!     fn write_to(&self, protocol: &mut dyn OutputProtocol) -> Result<(), BridgeError> {
//!         protocol.write_struct_begin(&StructIdent::new("Beacon"))?;
//!         protocol.write_field_begin(&FieldIdent::new("name", Kind::Text, 1))?;
//!         protocol.write_string(&self.name)?;
//!         protocol.write_field_end()?;
//!         if !self.tags.is_empty() {
//!             protocol.write_field_begin(&FieldIdent::new("tags", Kind::List, 2))?;
//!             protocol.write_list_begin(&ListIdent::new(Kind::Text, self.tags.len()))?;
//!             for tag in &self.tags {
//!                 protocol.write_string(tag)?;
//!             }
//!             protocol.write_list_end()?;
//!             protocol.write_field_end()?;
//!         }
//!         protocol.write_field_stop()?;
//!         protocol.write_struct_end()
//!     }
//!
//!     fn read_from(&mut self, protocol: &mut dyn InputProtocol) -> Result<(), BridgeError> {
//!         protocol.read_struct_begin()?;
//!         while let Some(field) = protocol.read_field_begin()? {
//!             match field.name.as_str() {
//!                 "name" => self.name = protocol.read_string()?,
//!                 "tags" => {
//!                     let list = protocol.read_list_begin()?;
//!                     for _ in 0..list.size {
//!                         self.tags.push(protocol.read_string()?);
//!                     }
//!                     protocol.read_list_end()?;
//!                 }
//!                 _ => protocol.skip(field.kind)?,
//!             }
//!             protocol.read_field_end()?;
//!         }
//!         protocol.read_struct_end()
//!     }
//! }
//!
//! let beacon = Beacon {
//!     name: "simple string".to_string(),
//!     tags: vec!["toto1".into(), "toto1".into(), "toto3".into()],
//! };
//! let document = to_document(&beacon).unwrap();
//! assert_eq!(
//!     document,
//!     doc! { "name" => "simple string", "tags" => vec!["toto1", "toto1", "toto3"] },
//! );
//!
//! let mut decoded = Beacon::default();
//! from_document(&mut decoded, &document).unwrap();
//! assert_eq!(decoded, beacon);
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod bridge;
mod error;
mod options;
mod protocol;
mod reader;
mod value;
mod writer;

#[cfg(test)]
mod tests;

pub use bridge::{from_document, from_document_with_options, to_document, to_document_with_options};
pub use error::{BridgeError, Result};
pub use options::BridgeOptions;
pub use protocol::{
    FieldIdent, InputProtocol, Kind, ListIdent, MapIdent, MessageIdent, MessageKind,
    OutputProtocol, Record, SetIdent, StructIdent,
};
pub use reader::DocumentReader;
pub use value::{Array, Document, Value};
pub use writer::DocumentWriter;

/// Macro to build a [`Document`] from `key => value` pairs.
///
/// Values go through [`Value`]'s `From` conversions, so scalars, vectors and
/// nested documents all work directly.
///
/// ```rust
/// # use docmodem::{doc, Value};
/// let d = doc! {
///     "name" => "simple string",
///     "tags" => vec!["toto1", "toto1", "toto3"],
/// };
/// assert_eq!(d.get("name"), Some(&Value::String("simple string".into())));
/// ```
#[macro_export]
macro_rules! doc {
    () => { $crate::Document::new() };
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut document = $crate::Document::new();
        $( document.insert($key, $value); )+
        document
    }};
}
