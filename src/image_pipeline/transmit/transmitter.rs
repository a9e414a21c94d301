use tracing::{info, instrument, warn};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::config::ArchiveConfig;
use crate::image_pipeline::presentation::PresentationRecord;
use crate::image_pipeline::transmit::association::Association;
use crate::image_pipeline::transmit::dimse::StoreResponse;

/// Result of one transmission attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionOutcome {
    pub succeeded: bool,
    /// C-STORE status when the archive answered
    pub status: Option<u16>,
    pub detail: String,
}

impl TransmissionOutcome {
    fn stored(response: &StoreResponse) -> Self {
        Self {
            succeeded: true,
            status: Some(response.status),
            detail: format!("stored with status 0x{:04X}", response.status),
        }
    }

    fn failed(detail: String) -> Self {
        Self {
            succeeded: false,
            status: None,
            detail,
        }
    }
}

pub trait ArchiveTransmitter: Send + Sync {
    /// One attempt, no retry. Failures are reported in the outcome.
    fn send(&self, record: &PresentationRecord) -> TransmissionOutcome;
}

/// Sends records to a DICOM storage SCP, one association per record
pub struct DicomTransmitter {
    config: ArchiveConfig,
}

impl DicomTransmitter {
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn try_send(&self, record: &PresentationRecord) -> Result<StoreResponse> {
        let mut association = Association::request(&self.config, record.sop_class_uid())?;

        let result = record
            .encode(association.transfer_syntax())
            .and_then(|dataset| {
                association.store(record.sop_class_uid(), record.sop_instance_uid(), &dataset)
            });

        if let Err(e) = association.release() {
            warn!("Release failed, aborting association: {}", e);
            association.abort();
        }
        result
    }
}

impl ArchiveTransmitter for DicomTransmitter {
    #[instrument(skip(self, record), fields(peer = %self.config.peer(), sop_instance = record.sop_instance_uid()))]
    fn send(&self, record: &PresentationRecord) -> TransmissionOutcome {
        match self.try_send(record) {
            Ok(response) => {
                info!(status = response.status, "Presentation state stored");
                TransmissionOutcome::stored(&response)
            }
            Err(e) => {
                warn!("Transmission failed: {}", e);
                TransmissionOutcome::failed(e.to_string())
            }
        }
    }
}

/// Sends `record` to `host:port` with the default timeout and PDU size.
pub fn send(
    record: &PresentationRecord,
    host: &str,
    port: u16,
    local_ae_title: &str,
    remote_ae_title: &str,
) -> TransmissionOutcome {
    let config = ArchiveConfig {
        host: host.to_string(),
        port,
        local_ae_title: local_ae_title.to_string(),
        remote_ae_title: remote_ae_title.to_string(),
        ..ArchiveConfig::default()
    };
    DicomTransmitter::new(&config).send(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::presentation::PresentationBuilder;
    use crate::image_pipeline::raw::SourceMetadata;

    fn record() -> PresentationRecord {
        let source = SourceMetadata {
            patient_name: Some("DOE^JANE".to_string()),
            patient_id: Some("PID-1".to_string()),
            study_instance_uid: Some("1.2.3".to_string()),
            series_instance_uid: Some("1.2.3.4".to_string()),
            series_number: Some(1),
            instance_number: Some(1),
            sop_class_uid: Some("1.2.3.5".to_string()),
            sop_instance_uid: Some("1.2.3.6".to_string()),
            rows: Some(1024),
            columns: Some(2048),
            ..Default::default()
        };
        PresentationBuilder::new().build(&source, &[], true).unwrap()
    }

    #[test]
    fn test_unreachable_archive_is_a_failed_outcome() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let outcome = send(&record(), "127.0.0.1", port, "LOCAL", "REMOTE");
        assert!(!outcome.succeeded);
        assert_eq!(outcome.status, None);
        assert!(outcome.detail.contains("REMOTE@127.0.0.1"));
    }
}
