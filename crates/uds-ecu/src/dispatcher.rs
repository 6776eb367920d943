//! UDS request dispatcher
//!
//! Decodes a raw request, routes it through the closed service table and
//! encodes the positive or negative response. `process` never fails: every
//! error is turned into response bytes.

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::did;
use crate::memory::MemoryStore;
use crate::nrc::NegativeResponseCode;
use crate::uds::{
    decode_address, general_reject, negative_response, positive_response, service_id,
};

type HandlerResult = Result<Vec<u8>, NegativeResponseCode>;
type Handler = fn(&ProtocolDispatcher, &[u8]) -> HandlerResult;

/// A supported service: SID, minimum request length, handler
pub struct ServiceDefinition {
    pub service_id: u8,
    pub name: &'static str,
    pub min_length: usize,
    handler: Handler,
}

/// Closed service table
pub const SERVICES: &[ServiceDefinition] = &[
    ServiceDefinition {
        service_id: service_id::READ_MEMORY_BY_ADDRESS,
        name: "ReadMemoryByAddress",
        min_length: 5,
        handler: ProtocolDispatcher::handle_read_memory,
    },
    ServiceDefinition {
        service_id: service_id::WRITE_MEMORY_BY_ADDRESS,
        name: "WriteMemoryByAddress",
        min_length: 5,
        handler: ProtocolDispatcher::handle_write_memory,
    },
    ServiceDefinition {
        service_id: service_id::ECU_RESET,
        name: "ECUReset",
        min_length: 1,
        handler: ProtocolDispatcher::handle_ecu_reset,
    },
    ServiceDefinition {
        service_id: service_id::READ_DATA_BY_ID,
        name: "ReadDataByIdentifier",
        min_length: 3,
        handler: ProtocolDispatcher::handle_read_data_by_id,
    },
];

/// Look up a service definition by SID
pub fn service(sid: u8) -> Option<&'static ServiceDefinition> {
    SERVICES.iter().find(|svc| svc.service_id == sid)
}

/// Simulated ECU protocol front end. Owns the memory store.
pub struct ProtocolDispatcher {
    memory: RwLock<MemoryStore>,
}

impl ProtocolDispatcher {
    pub fn new() -> Self {
        Self {
            memory: RwLock::new(MemoryStore::new()),
        }
    }

    /// Process a UDS request and return the response
    pub fn process(&self, request: &[u8]) -> Vec<u8> {
        let Some(&sid) = request.first() else {
            debug!("Empty request");
            return general_reject();
        };

        let Some(svc) = service(sid) else {
            debug!(service_id = format!("0x{:02X}", sid), "Unsupported service");
            return negative_response(sid, NegativeResponseCode::ServiceNotSupported.into());
        };

        if request.len() < svc.min_length {
            debug!(
                service = svc.name,
                length = request.len(),
                min_length = svc.min_length,
                "Request too short"
            );
            return negative_response(
                sid,
                NegativeResponseCode::IncorrectMessageLengthOrFormat.into(),
            );
        }

        match (svc.handler)(self, request) {
            Ok(response) => response,
            Err(nrc) => {
                debug!(service = svc.name, %nrc, "Negative response");
                negative_response(sid, nrc.into())
            }
        }
    }

    /// Read memory directly (bypassing the protocol)
    pub fn read_memory(&self, address: usize, length: usize) -> Option<Vec<u8>> {
        self.memory
            .read()
            .read(address, length)
            .ok()
            .map(<[u8]>::to_vec)
    }

    // =========================================================================
    // ReadMemoryByAddress (0x23): [0x23, addr_hi, addr_mid, addr_lo, length]
    // =========================================================================

    fn handle_read_memory(&self, request: &[u8]) -> HandlerResult {
        let address = decode_address([request[1], request[2], request[3]]) as usize;
        let length = request[4] as usize;

        let memory = self.memory.read();
        let data = memory.read(address, length).inspect_err(|e| {
            debug!(error = %e, "Read denied");
        })?;

        debug!(
            address = format!("0x{:06X}", address),
            length, "Reading memory"
        );
        Ok(positive_response(service_id::READ_MEMORY_BY_ADDRESS, data))
    }

    // =========================================================================
    // WriteMemoryByAddress (0x3D): [0x3D, addr_hi, addr_mid, addr_lo, data...]
    // =========================================================================

    fn handle_write_memory(&self, request: &[u8]) -> HandlerResult {
        let address = decode_address([request[1], request[2], request[3]]) as usize;
        let data = &request[4..];

        self.memory.write().write(address, data).inspect_err(|e| {
            debug!(error = %e, "Write denied");
        })?;

        info!(
            address = format!("0x{:06X}", address),
            length = data.len(),
            "Wrote memory"
        );
        Ok(positive_response(service_id::WRITE_MEMORY_BY_ADDRESS, &[]))
    }

    // =========================================================================
    // ECUReset (0x11): trailing bytes ignored
    // =========================================================================

    fn handle_ecu_reset(&self, _request: &[u8]) -> HandlerResult {
        self.memory.write().reset();
        info!("ECU reset: memory restored to power-on image");
        Ok(positive_response(service_id::ECU_RESET, &[]))
    }

    // =========================================================================
    // ReadDataByIdentifier (0x22): [0x22, did_hi, did_lo]
    // =========================================================================

    fn handle_read_data_by_id(&self, request: &[u8]) -> HandlerResult {
        let did = u16::from_be_bytes([request[1], request[2]]);

        let Some(entry) = did::lookup(did) else {
            debug!(did = format!("0x{:04X}", did), "Unknown DID");
            return Err(NegativeResponseCode::RequestOutOfRange);
        };

        debug!(did = format!("0x{:04X}", did), name = entry.name, "Reading DID");
        let mut response_data = Vec::with_capacity(2 + entry.value.len());
        response_data.extend_from_slice(&did.to_be_bytes());
        response_data.extend_from_slice(entry.value);
        Ok(positive_response(service_id::READ_DATA_BY_ID, &response_data))
    }
}

impl Default for ProtocolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
