use tracing::debug;

use super::element::{DataSet, Tag, Value, Vr};
use super::tags;
use super::uid::{
    TransferSyntax, DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN, EXPLICIT_VR_BIG_ENDIAN,
};
use crate::image_pipeline::common::error::{PipelineError, Result};

const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;
const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";

/// A parsed file: meta group (empty for bare data sets), body, and the body's
/// transfer syntax.
#[derive(Debug, Clone)]
pub struct Part10File {
    pub meta: DataSet,
    pub dataset: DataSet,
    pub transfer_syntax: TransferSyntax,
}

/// Reads a Part 10 file, or a bare implicit-VR data set when no `DICM` magic
/// is present.
pub fn read_part10(data: &[u8]) -> Result<Part10File> {
    let has_magic = data.len() >= PREAMBLE_LEN + MAGIC.len()
        && &data[PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()] == MAGIC;

    if !has_magic {
        debug!("No DICM magic, reading {} bytes as implicit VR little endian", data.len());
        let dataset = decode_dataset(data, TransferSyntax::ImplicitVrLittleEndian)?;
        return Ok(Part10File {
            meta: DataSet::new(),
            dataset,
            transfer_syntax: TransferSyntax::ImplicitVrLittleEndian,
        });
    }

    let mut reader = ElementReader::new(&data[PREAMBLE_LEN + MAGIC.len()..], true);
    let mut meta = DataSet::new();
    while let Some(tag) = reader.peek_tag()? {
        if tag.group() != 0x0002 {
            break;
        }
        reader.read_into(&mut meta)?;
    }

    let ts_uid = meta
        .string(tags::TRANSFER_SYNTAX_UID)
        .ok_or_else(|| PipelineError::DecodeError("file meta lacks a transfer syntax".to_string()))?;
    let transfer_syntax = TransferSyntax::from_uid(&ts_uid).ok_or_else(|| {
        let reason = match ts_uid.as_str() {
            EXPLICIT_VR_BIG_ENDIAN => "big endian".to_string(),
            DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN => "deflated".to_string(),
            other => format!("compressed or unknown transfer syntax {}", other),
        };
        PipelineError::UnsupportedFormat(reason)
    })?;

    let body_start = PREAMBLE_LEN + MAGIC.len() + reader.position();
    let dataset = decode_dataset(&data[body_start..], transfer_syntax)?;
    Ok(Part10File {
        meta,
        dataset,
        transfer_syntax,
    })
}

/// Decodes the top level of a data set. Nested sequences are skipped; element
/// values are kept as raw bytes and interpreted by the [`DataSet`] accessors.
pub fn decode_dataset(data: &[u8], syntax: TransferSyntax) -> Result<DataSet> {
    let mut reader = ElementReader::new(data, syntax.is_explicit());
    let mut dataset = DataSet::new();
    while reader.remaining() > 0 {
        reader.read_into(&mut dataset)?;
    }
    Ok(dataset)
}

struct ElementReader<'a> {
    data: &'a [u8],
    pos: usize,
    explicit: bool,
}

impl<'a> ElementReader<'a> {
    fn new(data: &'a [u8], explicit: bool) -> Self {
        Self { data, pos: 0, explicit }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(PipelineError::DecodeError(format!(
                "unexpected end of data at offset {} (needed {} bytes, {} left)",
                self.pos,
                n,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn tag(&mut self) -> Result<Tag> {
        let group = self.u16()?;
        let element = self.u16()?;
        Ok(Tag(group, element))
    }

    fn peek_tag(&self) -> Result<Option<Tag>> {
        if self.remaining() < 4 {
            return Ok(None);
        }
        let b = &self.data[self.pos..self.pos + 4];
        Ok(Some(Tag(
            u16::from_le_bytes([b[0], b[1]]),
            u16::from_le_bytes([b[2], b[3]]),
        )))
    }

    /// VR and value length following a tag that is not a delimiter.
    fn header(&mut self, tag: Tag) -> Result<(Vr, u32)> {
        if !self.explicit {
            return Ok((tags::implicit_vr(tag), self.u32()?));
        }
        let code = self.take(2)?;
        let vr = Vr::from_bytes([code[0], code[1]]).ok_or_else(|| {
            PipelineError::DecodeError(format!(
                "invalid VR {:?} for {} at offset {}",
                String::from_utf8_lossy(code),
                tag,
                self.pos - 2
            ))
        })?;
        if vr.has_long_length() {
            self.take(2)?;
            Ok((vr, self.u32()?))
        } else {
            Ok((vr, u32::from(self.u16()?)))
        }
    }

    fn read_into(&mut self, dataset: &mut DataSet) -> Result<()> {
        let tag = self.tag()?;
        if tag.group() == 0xFFFE {
            // Stray delimiter at top level; its length field is always present.
            let len = self.u32()?;
            if len != UNDEFINED_LENGTH {
                self.take(len as usize)?;
            }
            return Ok(());
        }

        let (vr, len) = self.header(tag)?;
        if len == UNDEFINED_LENGTH {
            if tag == tags::PIXEL_DATA {
                return Err(PipelineError::UnsupportedFormat(
                    "encapsulated pixel data".to_string(),
                ));
            }
            self.skip_undefined_sequence()?;
            return Ok(());
        }

        let value = self.take(len as usize)?;
        if vr == Vr::SQ {
            return Ok(());
        }
        dataset.put(tag, vr, Value::Bytes(value.to_vec()));
        Ok(())
    }

    fn skip_undefined_sequence(&mut self) -> Result<()> {
        loop {
            let tag = self.tag()?;
            let len = self.u32()?;
            match tag {
                tags::SEQUENCE_DELIMITATION => return Ok(()),
                tags::ITEM if len == UNDEFINED_LENGTH => self.skip_undefined_item()?,
                tags::ITEM => {
                    self.take(len as usize)?;
                }
                other => {
                    return Err(PipelineError::DecodeError(format!(
                        "unexpected {} inside a sequence",
                        other
                    )));
                }
            }
        }
    }

    fn skip_undefined_item(&mut self) -> Result<()> {
        loop {
            let tag = self.tag()?;
            if tag == tags::ITEM_DELIMITATION {
                self.u32()?;
                return Ok(());
            }
            let (_, len) = self.header(tag)?;
            if len == UNDEFINED_LENGTH {
                self.skip_undefined_sequence()?;
            } else {
                self.take(len as usize)?;
            }
        }
    }
}
