//! UDS Negative Response Codes (NRC)

use std::fmt;

use crate::memory::MemoryError;

/// Negative Response Codes produced or recognised by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegativeResponseCode {
    GeneralReject,
    ServiceNotSupported,
    SubFunctionNotSupported,
    IncorrectMessageLengthOrFormat,
    ConditionsNotCorrect,
    RequestOutOfRange,
    SecurityAccessDenied,
    GeneralProgrammingFailure,

    /// Unknown/reserved NRC
    Unknown(u8),
}

impl NegativeResponseCode {
    /// Human-readable explanation, as shown to a tester
    pub fn description(&self) -> String {
        match self {
            Self::GeneralReject => "General reject".to_string(),
            Self::ServiceNotSupported => "Service not supported".to_string(),
            Self::SubFunctionNotSupported => "Sub-function not supported".to_string(),
            Self::IncorrectMessageLengthOrFormat => "Incorrect message length".to_string(),
            Self::ConditionsNotCorrect => "Conditions not correct".to_string(),
            Self::RequestOutOfRange => "Request out of range".to_string(),
            Self::SecurityAccessDenied => "Security access denied".to_string(),
            Self::GeneralProgrammingFailure => "General programming failure".to_string(),
            Self::Unknown(v) => format!("Unknown error (NRC=0x{:02X})", v),
        }
    }
}

impl From<u8> for NegativeResponseCode {
    fn from(value: u8) -> Self {
        match value {
            0x10 => Self::GeneralReject,
            0x11 => Self::ServiceNotSupported,
            0x12 => Self::SubFunctionNotSupported,
            0x13 => Self::IncorrectMessageLengthOrFormat,
            0x22 => Self::ConditionsNotCorrect,
            0x31 => Self::RequestOutOfRange,
            0x33 => Self::SecurityAccessDenied,
            0x72 => Self::GeneralProgrammingFailure,
            other => Self::Unknown(other),
        }
    }
}

impl From<NegativeResponseCode> for u8 {
    fn from(nrc: NegativeResponseCode) -> Self {
        match nrc {
            NegativeResponseCode::GeneralReject => 0x10,
            NegativeResponseCode::ServiceNotSupported => 0x11,
            NegativeResponseCode::SubFunctionNotSupported => 0x12,
            NegativeResponseCode::IncorrectMessageLengthOrFormat => 0x13,
            NegativeResponseCode::ConditionsNotCorrect => 0x22,
            NegativeResponseCode::RequestOutOfRange => 0x31,
            NegativeResponseCode::SecurityAccessDenied => 0x33,
            NegativeResponseCode::GeneralProgrammingFailure => 0x72,
            NegativeResponseCode::Unknown(v) => v,
        }
    }
}

/// Every store failure is an address range the ECU cannot serve
impl From<MemoryError> for NegativeResponseCode {
    fn from(_: MemoryError) -> Self {
        Self::RequestOutOfRange
    }
}

impl fmt::UpperHex for NegativeResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value: u8 = (*self).into();
        fmt::UpperHex::fmt(&value, f)
    }
}

impl fmt::Display for NegativeResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeneralReject => write!(f, "GeneralReject"),
            Self::ServiceNotSupported => write!(f, "ServiceNotSupported"),
            Self::SubFunctionNotSupported => write!(f, "SubFunctionNotSupported"),
            Self::IncorrectMessageLengthOrFormat => write!(f, "IncorrectMessageLengthOrFormat"),
            Self::ConditionsNotCorrect => write!(f, "ConditionsNotCorrect"),
            Self::RequestOutOfRange => write!(f, "RequestOutOfRange"),
            Self::SecurityAccessDenied => write!(f, "SecurityAccessDenied"),
            Self::GeneralProgrammingFailure => write!(f, "GeneralProgrammingFailure"),
            Self::Unknown(v) => write!(f, "Unknown(0x{:02X})", v),
        }
    }
}
