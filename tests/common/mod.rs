#![allow(dead_code)]

use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gsps_annotator::image_pipeline::config::ArchiveConfig;
use gsps_annotator::image_pipeline::dicom::{
    decode_dataset, tags, write_part10, DataSet, TransferSyntax, Value, Vr,
};
use gsps_annotator::image_pipeline::transmit::dimse::{c_store_rsp, decode_command, encode_command};
use gsps_annotator::image_pipeline::transmit::pdu::{
    read_pdu, AssociateAccept, AssociateReject, Pdu, Pdv, PresentationContextResult, UserInformation,
};

pub const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";

/// Max PDU length the fake archive announces, small enough to force fragmentation
pub const ARCHIVE_MAX_PDU: u32 = 1024;

#[derive(Debug, Clone, Copy)]
pub enum ArchiveMode {
    /// Accept the association and answer every C-STORE with `status`
    Accept { status: u16 },
    /// Answer the association request with A-ASSOCIATE-RJ
    Reject,
    /// Accept the association but refuse every presentation context
    NoContext,
    /// Read the association request and never answer
    Hang,
}

#[derive(Debug, Clone)]
pub struct ReceivedStore {
    pub command: DataSet,
    pub dataset: Vec<u8>,
    pub fragments: usize,
}

impl ReceivedStore {
    pub fn decode(&self, syntax: TransferSyntax) -> DataSet {
        decode_dataset(&self.dataset, syntax).unwrap()
    }
}

#[derive(Debug, Default)]
pub struct ArchiveLog {
    pub associations: usize,
    pub stores: Vec<ReceivedStore>,
    /// P-DATA-TF PDUs received, on any association
    pub pdata_pdus: usize,
    pub releases: usize,
    pub aborts: usize,
}

/// In-process storage SCP serving a fixed number of connections.
pub struct FakeArchive {
    pub port: u16,
    log: Arc<Mutex<ArchiveLog>>,
    handle: JoinHandle<()>,
}

impl FakeArchive {
    pub fn start(mode: ArchiveMode, connections: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let log = Arc::new(Mutex::new(ArchiveLog::default()));

        let server_log = Arc::clone(&log);
        let handle = thread::spawn(move || {
            for _ in 0..connections {
                let Ok((stream, _)) = listener.accept() else { return };
                stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
                serve(stream, mode, &server_log);
            }
        });

        Self { port, log, handle }
    }

    pub fn config(&self) -> ArchiveConfig {
        ArchiveConfig {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: self.port,
            local_ae_title: "TEST_SCU".to_string(),
            remote_ae_title: "FAKE_ARCHIVE".to_string(),
            timeout_secs: 5,
            ..ArchiveConfig::default()
        }
    }

    /// Waits for every expected connection to finish.
    pub fn finish(self) -> ArchiveLog {
        self.handle.join().unwrap();
        Arc::try_unwrap(self.log).unwrap().into_inner().unwrap()
    }
}

fn write(stream: &mut TcpStream, pdu: &Pdu) {
    use std::io::Write;
    stream.write_all(&pdu.encode()).unwrap();
}

fn serve(mut stream: TcpStream, mode: ArchiveMode, log: &Mutex<ArchiveLog>) {
    let request = match read_pdu(&mut stream, 1 << 24) {
        Ok(Pdu::AssociateRq(request)) => request,
        _ => return,
    };
    log.lock().unwrap().associations += 1;

    let status = match mode {
        ArchiveMode::Reject => {
            write(
                &mut stream,
                &Pdu::AssociateRj(AssociateReject {
                    result: 1,
                    source: 1,
                    reason: 7,
                }),
            );
            drain(&mut stream, log);
            return;
        }
        ArchiveMode::Hang => {
            drain(&mut stream, log);
            return;
        }
        ArchiveMode::NoContext => None,
        ArchiveMode::Accept { status } => Some(status),
    };

    let contexts = request
        .contexts
        .iter()
        .map(|ctx| PresentationContextResult {
            id: ctx.id,
            result: if status.is_some() { 0 } else { 3 },
            transfer_syntax: ctx.transfer_syntaxes[0].clone(),
        })
        .collect();
    write(
        &mut stream,
        &Pdu::AssociateAc(AssociateAccept {
            called_ae: request.called_ae.clone(),
            calling_ae: request.calling_ae.clone(),
            application_context: request.application_context.clone(),
            contexts,
            user_info: UserInformation {
                max_pdu_length: ARCHIVE_MAX_PDU,
                implementation_class_uid: "1.2.826.0.1.3680043.9.9999".to_string(),
                implementation_version_name: None,
            },
        }),
    );

    let mut command = Vec::new();
    let mut dataset = Vec::new();
    let mut fragments = 0;
    loop {
        match read_pdu(&mut stream, 1 << 24) {
            Ok(Pdu::PData(pdvs)) => {
                log.lock().unwrap().pdata_pdus += 1;
                for pdv in pdvs {
                    if pdv.is_command {
                        command.extend_from_slice(&pdv.data);
                        continue;
                    }
                    fragments += 1;
                    dataset.extend_from_slice(&pdv.data);
                    if !pdv.is_last {
                        continue;
                    }
                    let request = decode_command(&command).unwrap();
                    let response = c_store_rsp(&request, status.unwrap_or(0xC000));
                    write(
                        &mut stream,
                        &Pdu::PData(vec![Pdv {
                            context_id: pdv.context_id,
                            is_command: true,
                            is_last: true,
                            data: encode_command(&response).unwrap(),
                        }]),
                    );
                    log.lock().unwrap().stores.push(ReceivedStore {
                        command: request,
                        dataset: std::mem::take(&mut dataset),
                        fragments,
                    });
                    command.clear();
                    fragments = 0;
                }
            }
            Ok(Pdu::ReleaseRq) => {
                log.lock().unwrap().releases += 1;
                write(&mut stream, &Pdu::ReleaseRp);
                return;
            }
            Ok(Pdu::Abort { .. }) => {
                log.lock().unwrap().aborts += 1;
                return;
            }
            _ => return,
        }
    }
}

/// Reads until the peer hangs up, counting anything that arrives.
fn drain(stream: &mut TcpStream, log: &Mutex<ArchiveLog>) {
    loop {
        match read_pdu(stream, 1 << 24) {
            Ok(Pdu::PData(_)) => log.lock().unwrap().pdata_pdus += 1,
            Ok(Pdu::Abort { .. }) => log.lock().unwrap().aborts += 1,
            Ok(Pdu::ReleaseRq) => log.lock().unwrap().releases += 1,
            Ok(_) => {}
            Err(_) => return,
        }
    }
}

/// A 16-bit single-frame CT image as a Part 10 file.
pub fn source_dicom(
    rows: u16,
    cols: u16,
    window: (f64, f64),
    pixel: impl Fn(usize, usize) -> u16,
) -> Vec<u8> {
    let sop_instance_uid = "1.2.826.0.1.3680043.9.9999.1.1";
    let mut ds = DataSet::new();
    ds.put_str(tags::PATIENT_NAME, Vr::PN, "DOE^JANE");
    ds.put_str(tags::PATIENT_ID, Vr::LO, "PID-7");
    ds.put_str(tags::STUDY_INSTANCE_UID, Vr::UI, "1.2.826.0.1.3680043.9.9999.1");
    ds.put_str(tags::SERIES_INSTANCE_UID, Vr::UI, "1.2.826.0.1.3680043.9.9999.1.2");
    ds.put_str(tags::SOP_CLASS_UID, Vr::UI, CT_IMAGE_STORAGE);
    ds.put_str(tags::SOP_INSTANCE_UID, Vr::UI, sop_instance_uid);
    ds.put_str(tags::MODALITY, Vr::CS, "CT");
    ds.put_str(tags::SERIES_NUMBER, Vr::IS, "2");
    ds.put_str(tags::INSTANCE_NUMBER, Vr::IS, "5");
    ds.put_u16(tags::SAMPLES_PER_PIXEL, 1);
    ds.put_u16(tags::ROWS, rows);
    ds.put_u16(tags::COLUMNS, cols);
    ds.put_u16(tags::BITS_ALLOCATED, 16);
    ds.put_u16(tags::BITS_STORED, 16);
    ds.put_u16(tags::PIXEL_REPRESENTATION, 0);
    ds.put_str(tags::WINDOW_CENTER, Vr::DS, window.0.to_string());
    ds.put_str(tags::WINDOW_WIDTH, Vr::DS, window.1.to_string());

    let (rows, cols) = (usize::from(rows), usize::from(cols));
    let mut pixels = Vec::with_capacity(rows * cols * 2);
    for row in 0..rows {
        for col in 0..cols {
            pixels.extend_from_slice(&pixel(row, col).to_le_bytes());
        }
    }
    ds.put(tags::PIXEL_DATA, Vr::OW, Value::Bytes(pixels));

    write_part10(&ds, CT_IMAGE_STORAGE, sop_instance_uid, TransferSyntax::ExplicitVrLittleEndian).unwrap()
}
