//! Tester-side response decoding

use std::fmt;

use crate::nrc::NegativeResponseCode;
use crate::uds::{service_id, POSITIVE_RESPONSE_OFFSET};

/// A classified UDS response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UdsResponse {
    /// No bytes came back
    Empty,
    /// `[0x7F, 0x00]`: the request carried no service ID
    GeneralReject,
    Negative {
        service_id: u8,
        nrc: NegativeResponseCode,
    },
    Positive {
        service_id: u8,
        payload: Vec<u8>,
    },
    Unrecognized(Vec<u8>),
}

impl UdsResponse {
    pub fn parse(bytes: &[u8]) -> Self {
        match bytes {
            [] => Self::Empty,
            [service_id::NEGATIVE_RESPONSE, 0x00] => Self::GeneralReject,
            [service_id::NEGATIVE_RESPONSE, sid, nrc, ..] => Self::Negative {
                service_id: *sid,
                nrc: NegativeResponseCode::from(*nrc),
            },
            // Truncated negative response: 0x7F also has the 0x40 bit set
            [service_id::NEGATIVE_RESPONSE, ..] => Self::Unrecognized(bytes.to_vec()),
            [first, payload @ ..] if first & POSITIVE_RESPONSE_OFFSET != 0 => Self::Positive {
                service_id: first - POSITIVE_RESPONSE_OFFSET,
                payload: payload.to_vec(),
            },
            other => Self::Unrecognized(other.to_vec()),
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Positive { .. })
    }

    /// Payload of a positive response
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Positive { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

impl fmt::Display for UdsResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "No response from ECU"),
            Self::GeneralReject => write!(f, "Error: general reject (no service ID)"),
            Self::Negative { service_id, nrc } => write!(
                f,
                "Error (Service 0x{:02X}): {}",
                service_id,
                nrc.description()
            ),
            Self::Positive {
                service_id,
                payload,
            } => {
                let data = match *service_id {
                    service_id::WRITE_MEMORY_BY_ADDRESS => "Write successful".to_string(),
                    service_id::ECU_RESET => "Reset complete".to_string(),
                    _ if payload.is_empty() => "No data".to_string(),
                    _ => hex_bytes(payload),
                };
                write!(f, "Success (Service 0x{:02X}): {}", service_id, data)
            }
            Self::Unrecognized(bytes) => write!(f, "Unknown response: {}", hex_bytes(bytes)),
        }
    }
}

/// Format bytes as space-separated upper-case hex, e.g. `62 F1 00`
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
