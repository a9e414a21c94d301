use bytes::{BufMut, BytesMut};

use super::element::{DataSet, Element, Tag, Value, Vr};
use super::tags;
use super::uid::{TransferSyntax, IMPLEMENTATION_CLASS_UID, IMPLEMENTATION_VERSION_NAME};
use crate::image_pipeline::common::error::{PipelineError, Result};

const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;
const PREAMBLE_LEN: usize = 128;

/// Encodes a data set in the given little-endian transfer syntax. Sequences
/// and items are written with undefined length and explicit delimiters.
pub fn encode_dataset(dataset: &DataSet, syntax: TransferSyntax) -> Result<Vec<u8>> {
    let mut buf = BytesMut::with_capacity(1024);
    write_dataset(&mut buf, dataset, syntax)?;
    Ok(buf.to_vec())
}

fn write_dataset(buf: &mut BytesMut, dataset: &DataSet, syntax: TransferSyntax) -> Result<()> {
    for (tag, element) in dataset.iter() {
        write_element(buf, *tag, element, syntax)?;
    }
    Ok(())
}

fn write_tag(buf: &mut BytesMut, tag: Tag) {
    buf.put_u16_le(tag.group());
    buf.put_u16_le(tag.element());
}

fn write_header(buf: &mut BytesMut, tag: Tag, vr: Vr, len: u32, syntax: TransferSyntax) -> Result<()> {
    write_tag(buf, tag);
    if !syntax.is_explicit() {
        buf.put_u32_le(len);
        return Ok(());
    }

    buf.put_slice(&vr.code());
    if vr.has_long_length() {
        buf.put_u16_le(0);
        buf.put_u32_le(len);
    } else {
        let short = u16::try_from(len).map_err(|_| {
            PipelineError::EncodeError(format!("{} value of {} bytes exceeds the {:?} limit", tag, len, vr))
        })?;
        buf.put_u16_le(short);
    }
    Ok(())
}

fn write_element(buf: &mut BytesMut, tag: Tag, element: &Element, syntax: TransferSyntax) -> Result<()> {
    if let Value::Sequence(items) = &element.value {
        write_header(buf, tag, Vr::SQ, UNDEFINED_LENGTH, syntax)?;
        for item in items {
            write_tag(buf, tags::ITEM);
            buf.put_u32_le(UNDEFINED_LENGTH);
            write_dataset(buf, item, syntax)?;
            write_tag(buf, tags::ITEM_DELIMITATION);
            buf.put_u32_le(0);
        }
        write_tag(buf, tags::SEQUENCE_DELIMITATION);
        buf.put_u32_le(0);
        return Ok(());
    }

    let bytes = value_bytes(element);
    let len = u32::try_from(bytes.len())
        .map_err(|_| PipelineError::EncodeError(format!("{} value too large", tag)))?;
    write_header(buf, tag, element.vr, len, syntax)?;
    buf.put_slice(&bytes);
    Ok(())
}

/// Value field bytes, padded to even length.
fn value_bytes(element: &Element) -> Vec<u8> {
    let mut out = match &element.value {
        Value::Strs(values) => values.join("\\").into_bytes(),
        Value::U16(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        Value::U32(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        Value::I32(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        Value::F32(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        Value::Bytes(bytes) => bytes.clone(),
        Value::Sequence(_) => Vec::new(),
    };
    if out.len() % 2 == 1 {
        out.push(element.vr.padding());
    }
    out
}

/// Writes a Part 10 file: preamble, `DICM`, explicit-VR meta group, then the
/// data set in `syntax`.
pub fn write_part10(
    dataset: &DataSet,
    sop_class_uid: &str,
    sop_instance_uid: &str,
    syntax: TransferSyntax,
) -> Result<Vec<u8>> {
    let mut meta = DataSet::new();
    meta.put(tags::FILE_META_VERSION, Vr::OB, Value::Bytes(vec![0x00, 0x01]));
    meta.put_str(tags::MEDIA_STORAGE_SOP_CLASS_UID, Vr::UI, sop_class_uid);
    meta.put_str(tags::MEDIA_STORAGE_SOP_INSTANCE_UID, Vr::UI, sop_instance_uid);
    meta.put_str(tags::TRANSFER_SYNTAX_UID, Vr::UI, syntax.uid());
    meta.put_str(tags::IMPLEMENTATION_CLASS_UID, Vr::UI, IMPLEMENTATION_CLASS_UID);
    meta.put_str(tags::IMPLEMENTATION_VERSION_NAME, Vr::SH, IMPLEMENTATION_VERSION_NAME);

    let meta_body = encode_dataset(&meta, TransferSyntax::ExplicitVrLittleEndian)?;
    let body = encode_dataset(dataset, syntax)?;

    let mut buf = BytesMut::with_capacity(PREAMBLE_LEN + 4 + 12 + meta_body.len() + body.len());
    buf.put_bytes(0, PREAMBLE_LEN);
    buf.put_slice(b"DICM");
    let mut group_length = DataSet::new();
    group_length.put(
        tags::FILE_META_GROUP_LENGTH,
        Vr::UL,
        Value::U32(vec![meta_body.len() as u32]),
    );
    write_dataset(&mut buf, &group_length, TransferSyntax::ExplicitVrLittleEndian)?;
    buf.put_slice(&meta_body);
    buf.put_slice(&body);
    Ok(buf.to_vec())
}
