//! DIMSE command sets for C-STORE (PS3.7 section 9.3.1).
//!
//! Command sets are always encoded in Implicit VR Little Endian and lead with
//! a CommandGroupLength element.

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::dicom::{decode_dataset, encode_dataset, tags, DataSet, TransferSyntax, Value, Vr};

pub const C_STORE_RQ: u16 = 0x0001;
pub const C_STORE_RSP: u16 = 0x8001;

const PRIORITY_MEDIUM: u16 = 0x0000;
const DATA_SET_PRESENT: u16 = 0x0000;
const NO_DATA_SET: u16 = 0x0101;

pub const STATUS_SUCCESS: u16 = 0x0000;
/// Warning statuses a storage SCP may return for a stored instance
pub const STATUS_WARNINGS: [u16; 3] = [0xB000, 0xB006, 0xB007];

/// True for success and for the storage warning statuses.
pub fn status_is_success(status: u16) -> bool {
    status == STATUS_SUCCESS || STATUS_WARNINGS.contains(&status)
}

pub fn c_store_rq(message_id: u16, sop_class_uid: &str, sop_instance_uid: &str) -> DataSet {
    let mut cmd = DataSet::new();
    cmd.put_str(tags::AFFECTED_SOP_CLASS_UID, Vr::UI, sop_class_uid);
    cmd.put_u16(tags::COMMAND_FIELD, C_STORE_RQ);
    cmd.put_u16(tags::MESSAGE_ID, message_id);
    cmd.put_u16(tags::PRIORITY, PRIORITY_MEDIUM);
    cmd.put_u16(tags::COMMAND_DATA_SET_TYPE, DATA_SET_PRESENT);
    cmd.put_str(tags::AFFECTED_SOP_INSTANCE_UID, Vr::UI, sop_instance_uid);
    cmd
}

/// Response command an archive sends back for a [`c_store_rq`].
pub fn c_store_rsp(request: &DataSet, status: u16) -> DataSet {
    let mut cmd = DataSet::new();
    if let Some(class) = request.string(tags::AFFECTED_SOP_CLASS_UID) {
        cmd.put_str(tags::AFFECTED_SOP_CLASS_UID, Vr::UI, class);
    }
    cmd.put_u16(tags::COMMAND_FIELD, C_STORE_RSP);
    cmd.put_u16(
        tags::MESSAGE_ID_BEING_RESPONDED_TO,
        request.uint16(tags::MESSAGE_ID).unwrap_or_default(),
    );
    cmd.put_u16(tags::COMMAND_DATA_SET_TYPE, NO_DATA_SET);
    cmd.put_u16(tags::STATUS, status);
    if let Some(instance) = request.string(tags::AFFECTED_SOP_INSTANCE_UID) {
        cmd.put_str(tags::AFFECTED_SOP_INSTANCE_UID, Vr::UI, instance);
    }
    cmd
}

/// Encodes a command set, computing its group length.
pub fn encode_command(command: &DataSet) -> Result<Vec<u8>> {
    let mut body = command.clone();
    body.remove(tags::COMMAND_GROUP_LENGTH);
    let encoded = encode_dataset(&body, TransferSyntax::ImplicitVrLittleEndian)?;

    let mut with_length = body;
    with_length.put(
        tags::COMMAND_GROUP_LENGTH,
        Vr::UL,
        Value::U32(vec![encoded.len() as u32]),
    );
    encode_dataset(&with_length, TransferSyntax::ImplicitVrLittleEndian)
}

pub fn decode_command(bytes: &[u8]) -> Result<DataSet> {
    decode_dataset(bytes, TransferSyntax::ImplicitVrLittleEndian)
}

/// Status of a C-STORE-RSP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    pub message_id: u16,
    pub status: u16,
    pub error_comment: Option<String>,
}

impl StoreResponse {
    pub fn parse(command: &DataSet) -> Result<Self> {
        let field = command.uint16(tags::COMMAND_FIELD).ok_or_else(|| {
            PipelineError::ProtocolError("response lacks a command field".to_string())
        })?;
        if field != C_STORE_RSP {
            return Err(PipelineError::ProtocolError(format!(
                "expected C-STORE-RSP, got command 0x{:04X}",
                field
            )));
        }
        let status = command
            .uint16(tags::STATUS)
            .ok_or_else(|| PipelineError::ProtocolError("C-STORE-RSP lacks a status".to_string()))?;
        Ok(Self {
            message_id: command
                .uint16(tags::MESSAGE_ID_BEING_RESPONDED_TO)
                .unwrap_or_default(),
            status,
            error_comment: command.string(tags::ERROR_COMMENT),
        })
    }

    pub fn is_success(&self) -> bool {
        status_is_success(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_length_covers_following_elements() {
        let bytes = encode_command(&c_store_rq(7, "1.2.3", "1.2.3.4")).unwrap();
        // (0000,0000) UL, 4 bytes
        assert_eq!(&bytes[..8], &[0, 0, 0, 0, 4, 0, 0, 0]);
        let group_length = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        assert_eq!(group_length, bytes.len() - 12);

        let decoded = decode_command(&bytes).unwrap();
        assert_eq!(decoded.uint16(tags::COMMAND_FIELD), Some(C_STORE_RQ));
        assert_eq!(decoded.uint16(tags::MESSAGE_ID), Some(7));
        assert_eq!(
            decoded.string(tags::AFFECTED_SOP_INSTANCE_UID).as_deref(),
            Some("1.2.3.4")
        );
    }

    #[test]
    fn test_response_round_trip() {
        let request = c_store_rq(3, "1.2.3", "1.2.3.4");
        let bytes = encode_command(&c_store_rsp(&request, 0xB007)).unwrap();
        let response = StoreResponse::parse(&decode_command(&bytes).unwrap()).unwrap();
        assert_eq!(response.message_id, 3);
        assert_eq!(response.status, 0xB007);
        assert!(response.is_success());
    }

    #[test]
    fn test_status_classes() {
        assert!(status_is_success(0x0000));
        assert!(status_is_success(0xB000));
        assert!(status_is_success(0xB006));
        assert!(!status_is_success(0xA700));
        assert!(!status_is_success(0xC000));
        assert!(!status_is_success(0x0110));
    }

    #[test]
    fn test_request_is_not_a_response() {
        let request = c_store_rq(1, "1.2", "1.2.3");
        assert!(matches!(
            StoreResponse::parse(&request),
            Err(PipelineError::ProtocolError(_))
        ));
    }
}
