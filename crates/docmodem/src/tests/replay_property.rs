//! Property: replaying any schema-shaped document through the reader and
//! folding the resulting event stream back through the writer rebuilds the
//! identical document, in the identical order.

use alloc::{format, string::String, vec::Vec};

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

use crate::{
    Document, DocumentReader, DocumentWriter, FieldIdent, InputProtocol, Kind, OutputProtocol,
    Result, StructIdent, Value,
};

/// Bounded arbitrary documents shaped like typed-object output: collections
/// are kind-homogeneous, because a schema dictates one element type per
/// collection.
#[derive(Clone, Debug)]
struct SchemaDoc(Document);

impl Arbitrary for SchemaDoc {
    fn arbitrary(g: &mut Gen) -> Self {
        SchemaDoc(arbitrary_document(g, 2))
    }
}

fn arbitrary_document(g: &mut Gen, depth: usize) -> Document {
    let width = usize::arbitrary(g) % 4;
    let mut document = Document::new();
    for i in 0..width {
        document.insert(format!("field_{i}"), arbitrary_value(g, depth));
    }
    document
}

fn arbitrary_scalar(g: &mut Gen) -> Value {
    match u8::arbitrary(g) % 6 {
        0 => Value::Boolean(bool::arbitrary(g)),
        1 => Value::Int32(i32::arbitrary(g)),
        2 => Value::Int64(i64::arbitrary(g)),
        3 => {
            let f = f64::arbitrary(g);
            Value::Double(if f.is_finite() { f } else { 0.0 })
        }
        4 => Value::String(String::arbitrary(g)),
        _ => Value::Binary(Vec::<u8>::arbitrary(g).into()),
    }
}

fn arbitrary_value(g: &mut Gen, depth: usize) -> Value {
    if depth == 0 {
        return arbitrary_scalar(g);
    }
    match u8::arbitrary(g) % 4 {
        0 | 1 => arbitrary_scalar(g),
        2 => arbitrary_array(g, depth),
        _ => Value::Document(arbitrary_document(g, depth - 1)),
    }
}

fn arbitrary_array(g: &mut Gen, depth: usize) -> Value {
    let len = usize::arbitrary(g) % 3;
    let selector = u8::arbitrary(g) % 4;
    let items = (0..len)
        .map(|_| match selector {
            0 => Value::Int32(i32::arbitrary(g)),
            1 => Value::String(String::arbitrary(g)),
            2 => Value::Boolean(bool::arbitrary(g)),
            _ => Value::Document(arbitrary_document(g, depth - 1)),
        })
        .collect();
    Value::Array(items)
}

/// Schema-free event pump: reads whatever the replay announces and writes it
/// straight back out.
fn replay_struct(reader: &mut DocumentReader<'_>, writer: &mut DocumentWriter) -> Result<()> {
    reader.read_struct_begin()?;
    writer.write_struct_begin(&StructIdent::new("replayed"))?;
    while let Some(field) = reader.read_field_begin()? {
        writer.write_field_begin(&FieldIdent::new(field.name.clone(), field.kind, None))?;
        replay_value(reader, writer, field.kind)?;
        reader.read_field_end()?;
        writer.write_field_end()?;
    }
    writer.write_field_stop()?;
    reader.read_struct_end()?;
    writer.write_struct_end()
}

fn replay_value(
    reader: &mut DocumentReader<'_>,
    writer: &mut DocumentWriter,
    kind: Kind,
) -> Result<()> {
    match kind {
        Kind::Bool => writer.write_bool(reader.read_bool()?),
        Kind::I32 => writer.write_i32(reader.read_i32()?),
        Kind::I64 => writer.write_i64(reader.read_i64()?),
        Kind::Double => writer.write_double(reader.read_double()?),
        Kind::Text => writer.write_string(&reader.read_string()?),
        Kind::Bytes => writer.write_binary(reader.read_binary()?.as_slice()),
        Kind::Struct => replay_struct(reader, writer),
        Kind::List => {
            let ident = reader.read_list_begin()?;
            writer.write_list_begin(&ident)?;
            for _ in 0..ident.size {
                replay_value(reader, writer, ident.element)?;
            }
            reader.read_list_end()?;
            writer.write_list_end()
        }
        // Stored values only ever replay as the kinds above.
        Kind::Stop | Kind::I8 | Kind::I16 | Kind::Map | Kind::Set => {
            unreachable!("documents never announce {kind:?}")
        }
    }
}

fn rebuild(document: &Document) -> Document {
    let mut reader = DocumentReader::new(document);
    let mut writer = DocumentWriter::new();
    replay_struct(&mut reader, &mut writer).unwrap();
    writer.take_document().unwrap()
}

#[quickcheck]
fn replay_rebuilds_the_identical_document(input: SchemaDoc) -> bool {
    let SchemaDoc(document) = input;
    rebuild(&document) == document
}

#[quickcheck]
fn replay_order_is_deterministic(input: SchemaDoc) -> bool {
    let SchemaDoc(document) = input;
    let first: Vec<String> = rebuild(&document).keys().map(String::from).collect();
    let second: Vec<String> = rebuild(&document).keys().map(String::from).collect();
    let original: Vec<String> = document.keys().map(String::from).collect();
    first == original && second == original
}
