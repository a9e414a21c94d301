//! Requester side of a DICOM association.
//!
//! The association walks `Idle -> Associating -> Associated -> Sending ->
//! Released` on the success path. A rejected negotiation or a failed store
//! moves it to `Failed`; an association that was established is still
//! released from there, or aborted when release fails or the value is dropped.

use std::io::Write;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, warn};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::config::ArchiveConfig;
use crate::image_pipeline::dicom::uid::{
    APPLICATION_CONTEXT_NAME, IMPLEMENTATION_CLASS_UID, IMPLEMENTATION_VERSION_NAME,
};
use crate::image_pipeline::dicom::TransferSyntax;
use crate::image_pipeline::transmit::dimse::{
    c_store_rq, decode_command, encode_command, StoreResponse,
};
use crate::image_pipeline::transmit::pdu::{
    read_pdu, AssociateRequest, Pdu, Pdv, PresentationContextProposal, UserInformation,
    PDV_HEADER_LEN,
};

/// Upper bound on any PDU we accept, whatever the negotiated length.
const PDU_SANITY_LIMIT: usize = 16 * 1024 * 1024;

const PROPOSED_CONTEXT_ID: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationState {
    Idle,
    Associating,
    Associated,
    Sending,
    Released,
    Failed,
}

impl AssociationState {
    /// Moves to `next` if the protocol allows it.
    pub fn transition(self, next: AssociationState) -> Result<AssociationState> {
        use AssociationState::*;
        let allowed = matches!(
            (self, next),
            (Idle, Associating)
                | (Associating, Associated)
                | (Associated, Sending)
                | (Sending, Associated)
                | (Associated, Released)
                | (Failed, Released)
                | (Idle | Associating | Associated | Sending, Failed)
        );
        if allowed {
            Ok(next)
        } else {
            Err(PipelineError::ProtocolError(format!(
                "invalid association transition {:?} -> {:?}",
                self, next
            )))
        }
    }
}

pub struct Association {
    stream: TcpStream,
    state: AssociationState,
    /// Whether the peer still holds a session for us
    established: bool,
    peer: String,
    context_id: u8,
    transfer_syntax: TransferSyntax,
    peer_max_pdu: u32,
    local_max_pdu: u32,
    next_message_id: u16,
    timeout: Duration,
}

fn rejected(peer: &str, reason: impl Into<String>) -> PipelineError {
    PipelineError::AssociationRejected {
        peer: peer.to_string(),
        reason: reason.into(),
    }
}

/// Rewrites a socket timeout as `into(..)`, passing any other error through.
fn on_timeout(error: PipelineError, timeout: Duration, into: impl FnOnce(String) -> PipelineError) -> PipelineError {
    match &error {
        PipelineError::IoError(io) if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
            into(format!("timed out after {}s", timeout.as_secs()))
        }
        _ => error,
    }
}

fn connect(config: &ArchiveConfig) -> std::io::Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (config.host.as_str(), config.port).to_socket_addrs()?.collect();
    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, config.timeout()) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "host resolved to no addresses")
    }))
}

impl Association {
    /// Connects and negotiates a single presentation context for
    /// `abstract_syntax`, proposing Implicit then Explicit VR Little Endian.
    pub fn request(config: &ArchiveConfig, abstract_syntax: &str) -> Result<Association> {
        let peer = config.peer();
        let state = AssociationState::Idle.transition(AssociationState::Associating)?;

        let mut stream = connect(config)
            .map_err(|e| rejected(&peer, format!("connection failed: {}", e)))?;
        stream.set_read_timeout(Some(config.timeout()))?;
        stream.set_write_timeout(Some(config.timeout()))?;
        stream.set_nodelay(true)?;

        let request = Pdu::AssociateRq(AssociateRequest {
            called_ae: config.remote_ae_title.clone(),
            calling_ae: config.local_ae_title.clone(),
            application_context: APPLICATION_CONTEXT_NAME.to_string(),
            contexts: vec![PresentationContextProposal {
                id: PROPOSED_CONTEXT_ID,
                abstract_syntax: abstract_syntax.to_string(),
                transfer_syntaxes: vec![
                    TransferSyntax::ImplicitVrLittleEndian.uid().to_string(),
                    TransferSyntax::ExplicitVrLittleEndian.uid().to_string(),
                ],
            }],
            user_info: UserInformation {
                max_pdu_length: config.max_pdu_length,
                implementation_class_uid: IMPLEMENTATION_CLASS_UID.to_string(),
                implementation_version_name: Some(IMPLEMENTATION_VERSION_NAME.to_string()),
            },
        });
        let timeout = config.timeout();
        let negotiation_timeout = |e: PipelineError| on_timeout(e, timeout, |why| rejected(&peer, why));
        stream
            .write_all(&request.encode())
            .map_err(|e| negotiation_timeout(e.into()))?;
        debug!(peer = %peer, "A-ASSOCIATE-RQ sent");

        let accept = match read_pdu(&mut stream, PDU_SANITY_LIMIT).map_err(negotiation_timeout)? {
            Pdu::AssociateAc(accept) => accept,
            Pdu::AssociateRj(reject) => {
                state.transition(AssociationState::Failed)?;
                let _ = stream.shutdown(Shutdown::Both);
                return Err(rejected(&peer, reject.describe()));
            }
            Pdu::Abort { source, reason } => {
                let _ = stream.shutdown(Shutdown::Both);
                return Err(rejected(
                    &peer,
                    format!("aborted during negotiation (source {}, reason {})", source, reason),
                ));
            }
            other => {
                let _ = stream.shutdown(Shutdown::Both);
                return Err(PipelineError::ProtocolError(format!(
                    "expected association response, got {}",
                    other.name()
                )));
            }
        };

        let accepted = accept
            .contexts
            .iter()
            .filter(|ctx| ctx.is_accepted() && ctx.id == PROPOSED_CONTEXT_ID)
            .find_map(|ctx| {
                TransferSyntax::from_uid(&ctx.transfer_syntax).map(|ts| (ctx.id, ts))
            });

        let mut association = Association {
            stream,
            state: state.transition(AssociationState::Associated)?,
            established: true,
            peer,
            context_id: PROPOSED_CONTEXT_ID,
            transfer_syntax: TransferSyntax::ImplicitVrLittleEndian,
            peer_max_pdu: accept.user_info.max_pdu_length,
            local_max_pdu: config.max_pdu_length,
            next_message_id: 1,
            timeout,
        };

        match accepted {
            Some((context_id, transfer_syntax)) => {
                association.context_id = context_id;
                association.transfer_syntax = transfer_syntax;
                debug!(
                    peer = %association.peer,
                    syntax = ?transfer_syntax,
                    peer_max_pdu = association.peer_max_pdu,
                    "Association established"
                );
                Ok(association)
            }
            None => {
                if let Err(e) = association.release() {
                    warn!("Release after empty negotiation failed: {}", e);
                    association.abort();
                }
                Err(rejected(&association.peer, "no presentation context accepted"))
            }
        }
    }

    pub fn state(&self) -> AssociationState {
        self.state
    }

    pub fn transfer_syntax(&self) -> TransferSyntax {
        self.transfer_syntax
    }

    fn set_state(&mut self, next: AssociationState) -> Result<()> {
        self.state = self.state.transition(next)?;
        Ok(())
    }

    fn fail(&mut self) {
        if self.state != AssociationState::Released {
            self.state = AssociationState::Failed;
        }
    }

    /// Largest data slice that fits one PDV under the peer's limit.
    fn fragment_len(&self) -> usize {
        match self.peer_max_pdu as usize {
            0 => usize::MAX,
            max if max > PDV_HEADER_LEN => max - PDV_HEADER_LEN,
            _ => 1,
        }
    }

    fn send_message(&mut self, data: &[u8], is_command: bool) -> Result<()> {
        let fragment_len = self.fragment_len();
        let mut chunks = data.chunks(fragment_len).peekable();
        if chunks.peek().is_none() {
            let pdu = Pdu::PData(vec![Pdv {
                context_id: self.context_id,
                is_command,
                is_last: true,
                data: Vec::new(),
            }]);
            self.stream.write_all(&pdu.encode())?;
            return Ok(());
        }
        while let Some(chunk) = chunks.next() {
            let pdu = Pdu::PData(vec![Pdv {
                context_id: self.context_id,
                is_command,
                is_last: chunks.peek().is_none(),
                data: chunk.to_vec(),
            }]);
            self.stream.write_all(&pdu.encode())?;
        }
        Ok(())
    }

    fn read_limit(&self) -> usize {
        match self.local_max_pdu as usize {
            0 => PDU_SANITY_LIMIT,
            max => (max + PDV_HEADER_LEN).min(PDU_SANITY_LIMIT),
        }
    }

    fn receive_command(&mut self) -> Result<Vec<u8>> {
        let limit = self.read_limit();
        let timeout = self.timeout;
        let mut command = Vec::new();
        loop {
            let pdu = read_pdu(&mut self.stream, limit)
                .map_err(|e| on_timeout(e, timeout, |why| PipelineError::TransferFailed(format!("no C-STORE-RSP: {}", why))))?;
            match pdu {
                Pdu::PData(pdvs) => {
                    for pdv in pdvs {
                        if !pdv.is_command {
                            continue;
                        }
                        command.extend_from_slice(&pdv.data);
                        if pdv.is_last {
                            return Ok(command);
                        }
                    }
                }
                Pdu::Abort { source, reason } => {
                    self.established = false;
                    return Err(PipelineError::TransferFailed(format!(
                        "association aborted by peer (source {}, reason {})",
                        source, reason
                    )));
                }
                other => {
                    return Err(PipelineError::ProtocolError(format!(
                        "unexpected {} while awaiting C-STORE-RSP",
                        other.name()
                    )));
                }
            }
        }
    }

    /// Stores one encoded data set and returns the response.
    ///
    /// A non-success status is a `TransferFailed` error and leaves the
    /// association in `Failed`, still releasable.
    pub fn store(&mut self, sop_class_uid: &str, sop_instance_uid: &str, dataset: &[u8]) -> Result<StoreResponse> {
        self.set_state(AssociationState::Sending)?;
        let result = self.exchange_store(sop_class_uid, sop_instance_uid, dataset);
        match &result {
            Ok(_) => self.set_state(AssociationState::Associated)?,
            Err(_) => self.fail(),
        }
        result
    }

    fn exchange_store(&mut self, sop_class_uid: &str, sop_instance_uid: &str, dataset: &[u8]) -> Result<StoreResponse> {
        let message_id = self.next_message_id;
        self.next_message_id = self.next_message_id.wrapping_add(1);

        let command = encode_command(&c_store_rq(message_id, sop_class_uid, sop_instance_uid))?;
        self.send_message(&command, true)?;
        self.send_message(dataset, false)?;
        debug!(message_id, bytes = dataset.len(), "C-STORE-RQ sent");

        let response = StoreResponse::parse(&decode_command(&self.receive_command()?)?)?;
        if response.message_id != message_id {
            return Err(PipelineError::ProtocolError(format!(
                "response to message {} while awaiting {}",
                response.message_id, message_id
            )));
        }
        if !response.is_success() {
            return Err(PipelineError::TransferFailed(format!(
                "C-STORE status 0x{:04X}{}",
                response.status,
                response
                    .error_comment
                    .as_ref()
                    .map(|c| format!(": {}", c))
                    .unwrap_or_default()
            )));
        }
        Ok(response)
    }

    /// Orderly release. A no-op once the peer no longer holds the session.
    pub fn release(&mut self) -> Result<()> {
        if !self.established {
            return Ok(());
        }
        self.stream.write_all(&Pdu::ReleaseRq.encode())?;
        let limit = self.read_limit();
        let timeout = self.timeout;
        loop {
            let pdu = read_pdu(&mut self.stream, limit)
                .map_err(|e| on_timeout(e, timeout, |why| PipelineError::ProtocolError(format!("no A-RELEASE-RP: {}", why))))?;
            match pdu {
                Pdu::ReleaseRp => break,
                // late data from the peer is discarded
                Pdu::PData(_) => continue,
                Pdu::Abort { .. } => {
                    self.established = false;
                    self.fail();
                    return Err(PipelineError::ProtocolError(
                        "association aborted during release".to_string(),
                    ));
                }
                other => {
                    return Err(PipelineError::ProtocolError(format!(
                        "expected A-RELEASE-RP, got {}",
                        other.name()
                    )));
                }
            }
        }
        self.established = false;
        self.set_state(AssociationState::Released)?;
        let _ = self.stream.shutdown(Shutdown::Both);
        debug!(peer = %self.peer, "Association released");
        Ok(())
    }

    /// Sends A-ABORT and drops the connection. Errors are ignored.
    pub fn abort(&mut self) {
        if self.established {
            let abort = Pdu::Abort { source: 0, reason: 0 };
            if let Err(e) = self.stream.write_all(&abort.encode()) {
                debug!("A-ABORT not delivered: {}", e);
            }
            self.established = false;
        }
        let _ = self.stream.shutdown(Shutdown::Both);
        self.fail();
    }
}

impl Drop for Association {
    fn drop(&mut self) {
        if self.established {
            warn!(peer = %self.peer, "Association dropped while established, aborting");
            self.abort();
        }
    }
}
