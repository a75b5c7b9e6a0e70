//! Serialize/deserialize entry points.
//!
//! Thin drivers over the adapters: each call owns a fresh context stack and
//! document slot, so nothing leaks between calls and nothing needs locking.
//! The whole invocation runs to completion on the calling thread.

use crate::{
    error::Result,
    options::BridgeOptions,
    protocol::Record,
    reader::DocumentReader,
    value::Document,
    writer::DocumentWriter,
};

/// Serialize `record` into a document with default options.
///
/// Invokes the record's own `write_to` against a fresh [`DocumentWriter`]
/// and returns the finished document. On failure no document is returned;
/// the per-call writer and its half-built state are discarded.
pub fn to_document<T>(record: &T) -> Result<Document>
where
    T: Record + ?Sized,
{
    to_document_with_options(record, BridgeOptions::default())
}

/// Serialize `record` into a document with the given options.
pub fn to_document_with_options<T>(record: &T, options: BridgeOptions) -> Result<Document>
where
    T: Record + ?Sized,
{
    let mut writer = DocumentWriter::with_options(options);
    record.write_to(&mut writer)?;
    writer.into_document()
}

/// Populate `record` from `document` with default options.
///
/// Replays the document as protocol events against the record's own
/// `read_from`; the record never touches the document model directly.
pub fn from_document<T>(record: &mut T, document: &Document) -> Result<()>
where
    T: Record + ?Sized,
{
    from_document_with_options(record, document, BridgeOptions::default())
}

/// Populate `record` from `document` with the given options.
pub fn from_document_with_options<T>(
    record: &mut T,
    document: &Document,
    options: BridgeOptions,
) -> Result<()>
where
    T: Record + ?Sized,
{
    let mut reader = DocumentReader::with_options(document, options);
    record.read_from(&mut reader)
}
