//! Upper layer protocol data units (PS3.8 section 9.3).
//!
//! Every PDU starts with a 6-byte header: type, a reserved byte, and the
//! big-endian length of the rest. Variable items inside association PDUs use
//! a 4-byte header with a 16-bit length.

use std::io::Read;

use bytes::{Buf, BufMut, BytesMut};

use crate::image_pipeline::common::error::{PipelineError, Result};

pub const PDU_HEADER_LEN: usize = 6;
/// Item length field plus context id and message control header
pub const PDV_HEADER_LEN: usize = 6;

const PROTOCOL_VERSION: u16 = 0x0001;
const AE_TITLE_LEN: usize = 16;

const ASSOCIATE_RQ: u8 = 0x01;
const ASSOCIATE_AC: u8 = 0x02;
const ASSOCIATE_RJ: u8 = 0x03;
const P_DATA_TF: u8 = 0x04;
const RELEASE_RQ: u8 = 0x05;
const RELEASE_RP: u8 = 0x06;
const ABORT: u8 = 0x07;

const APPLICATION_CONTEXT_ITEM: u8 = 0x10;
const PRESENTATION_CONTEXT_RQ_ITEM: u8 = 0x20;
const PRESENTATION_CONTEXT_AC_ITEM: u8 = 0x21;
const ABSTRACT_SYNTAX_ITEM: u8 = 0x30;
const TRANSFER_SYNTAX_ITEM: u8 = 0x40;
const USER_INFORMATION_ITEM: u8 = 0x50;
const MAX_LENGTH_ITEM: u8 = 0x51;
const IMPLEMENTATION_CLASS_ITEM: u8 = 0x52;
const IMPLEMENTATION_VERSION_ITEM: u8 = 0x55;

const COMMAND_FLAG: u8 = 0x01;
const LAST_FLAG: u8 = 0x02;

#[derive(Debug, Clone, PartialEq)]
pub struct PresentationContextProposal {
    pub id: u8,
    pub abstract_syntax: String,
    pub transfer_syntaxes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresentationContextResult {
    pub id: u8,
    /// 0 acceptance, 1 user rejection, 2 no reason, 3 abstract syntax not
    /// supported, 4 transfer syntaxes not supported
    pub result: u8,
    pub transfer_syntax: String,
}

impl PresentationContextResult {
    pub fn is_accepted(&self) -> bool {
        self.result == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserInformation {
    /// Largest P-DATA-TF body the sender can receive; 0 means unlimited
    pub max_pdu_length: u32,
    pub implementation_class_uid: String,
    pub implementation_version_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociateRequest {
    pub called_ae: String,
    pub calling_ae: String,
    pub application_context: String,
    pub contexts: Vec<PresentationContextProposal>,
    pub user_info: UserInformation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociateAccept {
    pub called_ae: String,
    pub calling_ae: String,
    pub application_context: String,
    pub contexts: Vec<PresentationContextResult>,
    pub user_info: UserInformation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociateReject {
    pub result: u8,
    pub source: u8,
    pub reason: u8,
}

impl AssociateReject {
    pub fn describe(&self) -> String {
        let permanence = if self.result == 1 { "permanent" } else { "transient" };
        let reason = match (self.source, self.reason) {
            (1, 2) => "application context name not supported",
            (1, 3) => "calling AE title not recognized",
            (1, 7) => "called AE title not recognized",
            (1, _) => "rejected by service user",
            (2, 2) => "protocol version not supported",
            (2, _) => "rejected by service provider (ACSE)",
            (3, 1) => "temporary congestion",
            (3, 2) => "local limit exceeded",
            _ => "no reason given",
        };
        format!("{} rejection: {}", permanence, reason)
    }
}

/// One presentation data value fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Pdv {
    pub context_id: u8,
    pub is_command: bool,
    pub is_last: bool,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pdu {
    AssociateRq(AssociateRequest),
    AssociateAc(AssociateAccept),
    AssociateRj(AssociateReject),
    PData(Vec<Pdv>),
    ReleaseRq,
    ReleaseRp,
    Abort { source: u8, reason: u8 },
}

impl Pdu {
    pub fn name(&self) -> &'static str {
        match self {
            Pdu::AssociateRq(_) => "A-ASSOCIATE-RQ",
            Pdu::AssociateAc(_) => "A-ASSOCIATE-AC",
            Pdu::AssociateRj(_) => "A-ASSOCIATE-RJ",
            Pdu::PData(_) => "P-DATA-TF",
            Pdu::ReleaseRq => "A-RELEASE-RQ",
            Pdu::ReleaseRp => "A-RELEASE-RP",
            Pdu::Abort { .. } => "A-ABORT",
        }
    }

    fn pdu_type(&self) -> u8 {
        match self {
            Pdu::AssociateRq(_) => ASSOCIATE_RQ,
            Pdu::AssociateAc(_) => ASSOCIATE_AC,
            Pdu::AssociateRj(_) => ASSOCIATE_RJ,
            Pdu::PData(_) => P_DATA_TF,
            Pdu::ReleaseRq => RELEASE_RQ,
            Pdu::ReleaseRp => RELEASE_RP,
            Pdu::Abort { .. } => ABORT,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut body = BytesMut::new();
        match self {
            Pdu::AssociateRq(rq) => {
                write_associate_header(&mut body, &rq.called_ae, &rq.calling_ae);
                write_item(&mut body, APPLICATION_CONTEXT_ITEM, rq.application_context.as_bytes());
                for ctx in &rq.contexts {
                    let mut payload = BytesMut::new();
                    payload.put_slice(&[ctx.id, 0, 0, 0]);
                    write_item(&mut payload, ABSTRACT_SYNTAX_ITEM, ctx.abstract_syntax.as_bytes());
                    for ts in &ctx.transfer_syntaxes {
                        write_item(&mut payload, TRANSFER_SYNTAX_ITEM, ts.as_bytes());
                    }
                    write_item(&mut body, PRESENTATION_CONTEXT_RQ_ITEM, &payload);
                }
                write_user_info(&mut body, &rq.user_info);
            }
            Pdu::AssociateAc(ac) => {
                write_associate_header(&mut body, &ac.called_ae, &ac.calling_ae);
                write_item(&mut body, APPLICATION_CONTEXT_ITEM, ac.application_context.as_bytes());
                for ctx in &ac.contexts {
                    let mut payload = BytesMut::new();
                    payload.put_slice(&[ctx.id, 0, ctx.result, 0]);
                    write_item(&mut payload, TRANSFER_SYNTAX_ITEM, ctx.transfer_syntax.as_bytes());
                    write_item(&mut body, PRESENTATION_CONTEXT_AC_ITEM, &payload);
                }
                write_user_info(&mut body, &ac.user_info);
            }
            Pdu::AssociateRj(rj) => body.put_slice(&[0, rj.result, rj.source, rj.reason]),
            Pdu::PData(pdvs) => {
                for pdv in pdvs {
                    let mut control = 0;
                    if pdv.is_command {
                        control |= COMMAND_FLAG;
                    }
                    if pdv.is_last {
                        control |= LAST_FLAG;
                    }
                    body.put_u32(pdv.data.len() as u32 + 2);
                    body.put_u8(pdv.context_id);
                    body.put_u8(control);
                    body.put_slice(&pdv.data);
                }
            }
            Pdu::ReleaseRq | Pdu::ReleaseRp => body.put_u32(0),
            Pdu::Abort { source, reason } => body.put_slice(&[0, 0, *source, *reason]),
        }

        let mut out = BytesMut::with_capacity(PDU_HEADER_LEN + body.len());
        out.put_u8(self.pdu_type());
        out.put_u8(0);
        out.put_u32(body.len() as u32);
        out.put_slice(&body);
        out.to_vec()
    }

    pub fn decode(pdu_type: u8, body: &[u8]) -> Result<Pdu> {
        let mut buf = body;
        match pdu_type {
            ASSOCIATE_RQ | ASSOCIATE_AC => decode_associate(pdu_type, buf),
            ASSOCIATE_RJ => {
                need(buf, 4, "A-ASSOCIATE-RJ")?;
                Ok(Pdu::AssociateRj(AssociateReject {
                    result: buf[1],
                    source: buf[2],
                    reason: buf[3],
                }))
            }
            P_DATA_TF => {
                let mut pdvs = Vec::new();
                while buf.has_remaining() {
                    need(buf, 4, "PDV item")?;
                    let len = buf.get_u32() as usize;
                    if len < 2 {
                        return Err(PipelineError::ProtocolError(format!("PDV item of length {}", len)));
                    }
                    need(buf, len, "PDV item")?;
                    let context_id = buf.get_u8();
                    let control = buf.get_u8();
                    let data = buf[..len - 2].to_vec();
                    buf.advance(len - 2);
                    pdvs.push(Pdv {
                        context_id,
                        is_command: control & COMMAND_FLAG != 0,
                        is_last: control & LAST_FLAG != 0,
                        data,
                    });
                }
                Ok(Pdu::PData(pdvs))
            }
            RELEASE_RQ => Ok(Pdu::ReleaseRq),
            RELEASE_RP => Ok(Pdu::ReleaseRp),
            ABORT => {
                need(buf, 4, "A-ABORT")?;
                Ok(Pdu::Abort {
                    source: buf[2],
                    reason: buf[3],
                })
            }
            other => Err(PipelineError::ProtocolError(format!(
                "unknown PDU type 0x{:02X}",
                other
            ))),
        }
    }
}

/// Reads one PDU, refusing bodies larger than `max_len`.
pub fn read_pdu<R: Read>(reader: &mut R, max_len: usize) -> Result<Pdu> {
    let mut header = [0u8; PDU_HEADER_LEN];
    reader.read_exact(&mut header)?;
    let len = u32::from_be_bytes([header[2], header[3], header[4], header[5]]) as usize;
    if len > max_len {
        return Err(PipelineError::ProtocolError(format!(
            "PDU type 0x{:02X} of {} bytes exceeds limit of {}",
            header[0], len, max_len
        )));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Pdu::decode(header[0], &body)
}

fn need(buf: &[u8], n: usize, what: &str) -> Result<()> {
    if buf.len() < n {
        return Err(PipelineError::ProtocolError(format!(
            "truncated {}: needed {} bytes, {} left",
            what,
            n,
            buf.len()
        )));
    }
    Ok(())
}

fn write_item(buf: &mut BytesMut, item_type: u8, payload: &[u8]) {
    buf.put_u8(item_type);
    buf.put_u8(0);
    buf.put_u16(payload.len() as u16);
    buf.put_slice(payload);
}

fn write_ae_title(buf: &mut BytesMut, title: &str) {
    let mut field = [b' '; AE_TITLE_LEN];
    for (slot, byte) in field.iter_mut().zip(title.bytes()) {
        *slot = byte;
    }
    buf.put_slice(&field);
}

fn write_associate_header(buf: &mut BytesMut, called_ae: &str, calling_ae: &str) {
    buf.put_u16(PROTOCOL_VERSION);
    buf.put_u16(0);
    write_ae_title(buf, called_ae);
    write_ae_title(buf, calling_ae);
    buf.put_bytes(0, 32);
}

fn write_user_info(buf: &mut BytesMut, info: &UserInformation) {
    let mut payload = BytesMut::new();
    write_item(&mut payload, MAX_LENGTH_ITEM, &info.max_pdu_length.to_be_bytes());
    write_item(&mut payload, IMPLEMENTATION_CLASS_ITEM, info.implementation_class_uid.as_bytes());
    if let Some(version) = &info.implementation_version_name {
        write_item(&mut payload, IMPLEMENTATION_VERSION_ITEM, version.as_bytes());
    }
    write_item(buf, USER_INFORMATION_ITEM, &payload);
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c == ' ' || c == '\0')
        .to_string()
}

/// Splits a run of variable items into `(type, payload)` pairs.
fn items(mut buf: &[u8]) -> Result<Vec<(u8, &[u8])>> {
    let mut out = Vec::new();
    while buf.has_remaining() {
        need(buf, 4, "variable item")?;
        let item_type = buf.get_u8();
        buf.advance(1);
        let len = usize::from(buf.get_u16());
        need(buf, len, "variable item")?;
        out.push((item_type, &buf[..len]));
        buf.advance(len);
    }
    Ok(out)
}

fn decode_user_info(payload: &[u8]) -> Result<UserInformation> {
    let mut info = UserInformation {
        max_pdu_length: 0,
        implementation_class_uid: String::new(),
        implementation_version_name: None,
    };
    for (item_type, value) in items(payload)? {
        match item_type {
            MAX_LENGTH_ITEM => {
                need(value, 4, "maximum length item")?;
                info.max_pdu_length = u32::from_be_bytes([value[0], value[1], value[2], value[3]]);
            }
            IMPLEMENTATION_CLASS_ITEM => info.implementation_class_uid = text(value),
            IMPLEMENTATION_VERSION_ITEM => info.implementation_version_name = Some(text(value)),
            _ => {}
        }
    }
    Ok(info)
}

fn decode_associate(pdu_type: u8, mut buf: &[u8]) -> Result<Pdu> {
    need(buf, 68, "association header")?;
    buf.advance(4);
    let called_ae = text(&buf[..AE_TITLE_LEN]);
    buf.advance(AE_TITLE_LEN);
    let calling_ae = text(&buf[..AE_TITLE_LEN]);
    buf.advance(AE_TITLE_LEN);
    buf.advance(32);

    let mut application_context = String::new();
    let mut proposals = Vec::new();
    let mut results = Vec::new();
    let mut user_info = None;

    for (item_type, payload) in items(buf)? {
        match item_type {
            APPLICATION_CONTEXT_ITEM => application_context = text(payload),
            PRESENTATION_CONTEXT_RQ_ITEM => {
                need(payload, 4, "presentation context")?;
                let mut proposal = PresentationContextProposal {
                    id: payload[0],
                    abstract_syntax: String::new(),
                    transfer_syntaxes: Vec::new(),
                };
                for (sub_type, value) in items(&payload[4..])? {
                    match sub_type {
                        ABSTRACT_SYNTAX_ITEM => proposal.abstract_syntax = text(value),
                        TRANSFER_SYNTAX_ITEM => proposal.transfer_syntaxes.push(text(value)),
                        _ => {}
                    }
                }
                proposals.push(proposal);
            }
            PRESENTATION_CONTEXT_AC_ITEM => {
                need(payload, 4, "presentation context")?;
                let transfer_syntax = items(&payload[4..])?
                    .into_iter()
                    .find(|(sub_type, _)| *sub_type == TRANSFER_SYNTAX_ITEM)
                    .map(|(_, value)| text(value))
                    .unwrap_or_default();
                results.push(PresentationContextResult {
                    id: payload[0],
                    result: payload[2],
                    transfer_syntax,
                });
            }
            USER_INFORMATION_ITEM => user_info = Some(decode_user_info(payload)?),
            _ => {}
        }
    }

    let user_info = user_info.ok_or_else(|| {
        PipelineError::ProtocolError("association PDU without user information".to_string())
    })?;

    if pdu_type == ASSOCIATE_RQ {
        Ok(Pdu::AssociateRq(AssociateRequest {
            called_ae,
            calling_ae,
            application_context,
            contexts: proposals,
            user_info,
        }))
    } else {
        Ok(Pdu::AssociateAc(AssociateAccept {
            called_ae,
            calling_ae,
            application_context,
            contexts: results,
            user_info,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AssociateRequest {
        AssociateRequest {
            called_ae: "ANY-SCP".to_string(),
            calling_ae: "GSPS_ANNOTATOR".to_string(),
            application_context: "1.2.840.10008.3.1.1.1".to_string(),
            contexts: vec![PresentationContextProposal {
                id: 1,
                abstract_syntax: "1.2.840.10008.5.1.4.1.1.11.1".to_string(),
                transfer_syntaxes: vec![
                    "1.2.840.10008.1.2".to_string(),
                    "1.2.840.10008.1.2.1".to_string(),
                ],
            }],
            user_info: UserInformation {
                max_pdu_length: 16384,
                implementation_class_uid: "2.25.1".to_string(),
                implementation_version_name: Some("TEST".to_string()),
            },
        }
    }

    fn reparse(bytes: &[u8]) -> Pdu {
        read_pdu(&mut &bytes[..], 1 << 20).unwrap()
    }

    #[test]
    fn test_associate_rq_layout() {
        let bytes = Pdu::AssociateRq(request()).encode();
        assert_eq!(bytes[0], ASSOCIATE_RQ);
        let len = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]) as usize;
        assert_eq!(len, bytes.len() - PDU_HEADER_LEN);
        // protocol version, then space-padded called AE title
        assert_eq!(&bytes[6..8], &[0x00, 0x01]);
        assert_eq!(&bytes[10..26], b"ANY-SCP         ");
        assert_eq!(&bytes[26..42], b"GSPS_ANNOTATOR  ");
        // first variable item is the application context
        assert_eq!(bytes[74], APPLICATION_CONTEXT_ITEM);

        assert_eq!(reparse(&bytes), Pdu::AssociateRq(request()));
    }

    #[test]
    fn test_associate_ac_parses_results() {
        let accept = AssociateAccept {
            called_ae: "ANY-SCP".to_string(),
            calling_ae: "GSPS_ANNOTATOR".to_string(),
            application_context: "1.2.840.10008.3.1.1.1".to_string(),
            contexts: vec![PresentationContextResult {
                id: 1,
                result: 0,
                transfer_syntax: "1.2.840.10008.1.2.1".to_string(),
            }],
            user_info: UserInformation {
                max_pdu_length: 0,
                implementation_class_uid: "1.2.3".to_string(),
                implementation_version_name: None,
            },
        };
        match reparse(&Pdu::AssociateAc(accept.clone()).encode()) {
            Pdu::AssociateAc(parsed) => {
                assert_eq!(parsed, accept);
                assert!(parsed.contexts[0].is_accepted());
            }
            other => panic!("unexpected {}", other.name()),
        }
    }

    #[test]
    fn test_pdata_control_header() {
        let pdu = Pdu::PData(vec![Pdv {
            context_id: 1,
            is_command: true,
            is_last: true,
            data: vec![0xAA, 0xBB],
        }]);
        let bytes = pdu.encode();
        assert_eq!(
            bytes,
            vec![0x04, 0x00, 0, 0, 0, 8, 0, 0, 0, 4, 0x01, 0x03, 0xAA, 0xBB]
        );
        assert_eq!(reparse(&bytes), pdu);
    }

    #[test]
    fn test_fixed_size_pdus() {
        assert_eq!(Pdu::ReleaseRq.encode(), vec![0x05, 0, 0, 0, 0, 4, 0, 0, 0, 0]);
        assert_eq!(Pdu::ReleaseRp.encode(), vec![0x06, 0, 0, 0, 0, 4, 0, 0, 0, 0]);
        let abort = Pdu::Abort { source: 2, reason: 6 };
        assert_eq!(abort.encode(), vec![0x07, 0, 0, 0, 0, 4, 0, 0, 2, 6]);
        let reject = Pdu::AssociateRj(AssociateReject { result: 1, source: 1, reason: 7 });
        assert_eq!(reparse(&reject.encode()), reject);
    }

    #[test]
    fn test_reject_description() {
        let rj = AssociateReject { result: 1, source: 1, reason: 7 };
        assert_eq!(rj.describe(), "permanent rejection: called AE title not recognized");
    }

    #[test]
    fn test_oversized_and_truncated_pdus() {
        let bytes = Pdu::AssociateRq(request()).encode();
        assert!(matches!(
            read_pdu(&mut &bytes[..], 16),
            Err(PipelineError::ProtocolError(_))
        ));
        assert!(matches!(
            Pdu::decode(P_DATA_TF, &[0, 0, 0, 9, 1, 3]),
            Err(PipelineError::ProtocolError(_))
        ));
        assert!(matches!(
            Pdu::decode(0x42, &[]),
            Err(PipelineError::ProtocolError(_))
        ));
    }
}
