mod common;

use std::time::{Duration, Instant};

use common::{ArchiveMode, FakeArchive, ARCHIVE_MAX_PDU};

use gsps_annotator::image_pipeline::dicom::{tags, TransferSyntax};
use gsps_annotator::image_pipeline::transmit::dimse::C_STORE_RQ;
use gsps_annotator::image_pipeline::{
    ArchiveTransmitter, DicomTransmitter, MappedRegion, PresentationBuilder, PresentationRecord,
    SourceMetadata,
};

fn record(regions: usize) -> PresentationRecord {
    let source = SourceMetadata {
        patient_name: Some("DOE^JANE".to_string()),
        patient_id: Some("PID-7".to_string()),
        study_instance_uid: Some("1.2.3".to_string()),
        series_instance_uid: Some("1.2.3.4".to_string()),
        series_number: Some(2),
        instance_number: Some(5),
        sop_class_uid: Some(common::CT_IMAGE_STORAGE.to_string()),
        sop_instance_uid: Some("1.2.3.4.5".to_string()),
        rows: Some(1024),
        columns: Some(2048),
        ..Default::default()
    };
    let regions: Vec<MappedRegion> = (0..regions)
        .map(|i| MappedRegion {
            x: 100.0 + 10.0 * i as f64,
            y: 200.0,
            w: 50.0,
            h: 25.0,
            confidence: 0.9,
        })
        .collect();
    PresentationBuilder::new().build(&source, &regions, true).unwrap()
}

#[test]
fn stores_record_and_releases() {
    let archive = FakeArchive::start(ArchiveMode::Accept { status: 0x0000 }, 1);
    let transmitter = DicomTransmitter::new(&archive.config());
    let record = record(12);

    let outcome = transmitter.send(&record);
    let log = archive.finish();

    assert!(outcome.succeeded, "{}", outcome.detail);
    assert_eq!(outcome.status, Some(0x0000));
    assert_eq!(log.associations, 1);
    assert_eq!(log.releases, 1);
    assert_eq!(log.aborts, 0);
    assert_eq!(log.stores.len(), 1);

    let store = &log.stores[0];
    assert_eq!(store.command.uint16(tags::COMMAND_FIELD), Some(C_STORE_RQ));
    assert_eq!(
        store.command.string(tags::AFFECTED_SOP_INSTANCE_UID).as_deref(),
        Some(record.sop_instance_uid())
    );
    assert_eq!(
        store.dataset,
        record.encode(TransferSyntax::ImplicitVrLittleEndian).unwrap()
    );
    assert!(store.dataset.len() > ARCHIVE_MAX_PDU as usize);
    assert!(store.fragments > 1);

    let dataset = store.decode(TransferSyntax::ImplicitVrLittleEndian);
    assert_eq!(
        dataset.string(tags::SOP_CLASS_UID).as_deref(),
        Some(record.sop_class_uid())
    );
}

#[test]
fn warning_status_counts_as_stored() {
    let archive = FakeArchive::start(ArchiveMode::Accept { status: 0xB000 }, 1);
    let outcome = DicomTransmitter::new(&archive.config()).send(&record(1));
    archive.finish();

    assert!(outcome.succeeded);
    assert_eq!(outcome.status, Some(0xB000));
}

#[test]
fn rejected_association_sends_nothing() {
    let archive = FakeArchive::start(ArchiveMode::Reject, 1);
    let outcome = DicomTransmitter::new(&archive.config()).send(&record(1));
    let log = archive.finish();

    assert!(!outcome.succeeded);
    assert!(outcome.detail.contains("rejected"), "{}", outcome.detail);
    assert_eq!(log.associations, 1);
    assert_eq!(log.pdata_pdus, 0);
    assert!(log.stores.is_empty());
}

#[test]
fn no_accepted_context_is_released_without_data() {
    let archive = FakeArchive::start(ArchiveMode::NoContext, 1);
    let outcome = DicomTransmitter::new(&archive.config()).send(&record(1));
    let log = archive.finish();

    assert!(!outcome.succeeded);
    assert!(outcome.detail.contains("no presentation context"), "{}", outcome.detail);
    assert_eq!(log.pdata_pdus, 0);
    assert_eq!(log.releases, 1);
}

#[test]
fn failed_store_is_still_released() {
    let archive = FakeArchive::start(ArchiveMode::Accept { status: 0xA700 }, 1);
    let outcome = DicomTransmitter::new(&archive.config()).send(&record(1));
    let log = archive.finish();

    assert!(!outcome.succeeded);
    assert!(outcome.detail.contains("0xA700"), "{}", outcome.detail);
    assert_eq!(log.stores.len(), 1);
    assert_eq!(log.releases, 1);
    assert_eq!(log.aborts, 0);
}

#[test]
fn each_record_gets_its_own_association() {
    let archive = FakeArchive::start(ArchiveMode::Accept { status: 0x0000 }, 2);
    let transmitter = DicomTransmitter::new(&archive.config());

    assert!(transmitter.send(&record(1)).succeeded);
    assert!(transmitter.send(&record(0)).succeeded);
    let log = archive.finish();

    assert_eq!(log.associations, 2);
    assert_eq!(log.releases, 2);
    assert_eq!(log.stores.len(), 2);
}

#[test]
fn silent_archive_times_out() {
    let archive = FakeArchive::start(ArchiveMode::Hang, 1);
    let mut config = archive.config();
    config.timeout_secs = 1;

    let started = Instant::now();
    let outcome = DicomTransmitter::new(&config).send(&record(1));
    let elapsed = started.elapsed();
    let log = archive.finish();

    assert!(!outcome.succeeded);
    assert!(outcome.detail.contains("timed out after 1s"), "{}", outcome.detail);
    assert!(elapsed >= Duration::from_millis(900), "{:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "{:?}", elapsed);
    assert_eq!(log.associations, 1);
    assert_eq!(log.pdata_pdus, 0);
    assert_eq!(log.releases, 0);
}
