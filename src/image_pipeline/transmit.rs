//! Archive transmission module
//!
//! Stores presentation states on a remote archive over the DICOM upper layer
//! protocol: one association per record, a single C-STORE, then release.

mod association;
pub mod dimse;
pub mod pdu;
mod transmitter;

pub use association::{Association, AssociationState};
pub use transmitter::{send, ArchiveTransmitter, DicomTransmitter, TransmissionOutcome};
