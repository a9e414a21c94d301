//! Minimal DICOM data set codec
//!
//! Enough of PS3.5 to read single-frame grayscale images and to write
//! presentation states and DIMSE command sets: tags, VRs, an ordered data set,
//! and little-endian encoders/decoders for both implicit and explicit VR.

mod decode;
mod element;
mod encode;
pub mod tags;
pub mod uid;

pub use decode::{decode_dataset, read_part10, Part10File};
pub use element::{DataSet, Element, Tag, Value, Vr};
pub use encode::{encode_dataset, write_part10};
pub use uid::{generate_uid, TransferSyntax};
