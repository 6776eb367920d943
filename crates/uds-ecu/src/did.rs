//! Static data identifier (DID) table

/// ECU serial number
pub const ECU_SERIAL_NUMBER: u16 = 0xF100;
/// Software version
pub const SOFTWARE_VERSION: u16 = 0xF200;

/// A read-only DID entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataIdentifier {
    pub did: u16,
    pub name: &'static str,
    pub value: &'static [u8],
}

/// All DIDs the ECU answers. Closed set.
pub const DATA_IDENTIFIERS: &[DataIdentifier] = &[
    DataIdentifier {
        did: ECU_SERIAL_NUMBER,
        name: "ecu_serial_number",
        value: b"ECU12345",
    },
    DataIdentifier {
        did: SOFTWARE_VERSION,
        name: "software_version",
        value: b"1.0.0",
    },
];

/// Look up a DID
pub fn lookup(did: u16) -> Option<&'static DataIdentifier> {
    DATA_IDENTIFIERS.iter().find(|entry| entry.did == did)
}
