use uuid::Uuid;

/// Root for UUID-derived UIDs (PS3.5 B.2).
const UUID_UID_ROOT: &str = "2.25";

pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";

pub const GRAYSCALE_SOFTCOPY_PRESENTATION_STATE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.11.1";
pub const APPLICATION_CONTEXT_NAME: &str = "1.2.840.10008.3.1.1.1";

pub const IMPLEMENTATION_CLASS_UID: &str = "2.25.302749195830275624730811923856173934591";
pub const IMPLEMENTATION_VERSION_NAME: &str = "GSPS_ANNOT_010";

/// Generates a globally unique UID under the `2.25` root.
pub fn generate_uid() -> String {
    format!("{}.{}", UUID_UID_ROOT, Uuid::new_v4().as_u128())
}

/// Uncompressed little-endian transfer syntaxes, the only ones we read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSyntax {
    ImplicitVrLittleEndian,
    ExplicitVrLittleEndian,
}

impl TransferSyntax {
    pub fn uid(self) -> &'static str {
        match self {
            TransferSyntax::ImplicitVrLittleEndian => IMPLICIT_VR_LITTLE_ENDIAN,
            TransferSyntax::ExplicitVrLittleEndian => EXPLICIT_VR_LITTLE_ENDIAN,
        }
    }

    pub fn from_uid(uid: &str) -> Option<Self> {
        match uid.trim_end_matches(['\0', ' ']) {
            IMPLICIT_VR_LITTLE_ENDIAN => Some(TransferSyntax::ImplicitVrLittleEndian),
            EXPLICIT_VR_LITTLE_ENDIAN => Some(TransferSyntax::ExplicitVrLittleEndian),
            _ => None,
        }
    }

    pub fn is_explicit(self) -> bool {
        matches!(self, TransferSyntax::ExplicitVrLittleEndian)
    }
}
