//! UDS protocol constants and framing helpers

/// UDS Service IDs understood by the simulator
pub mod service_id {
    pub const ECU_RESET: u8 = 0x11;
    pub const READ_DATA_BY_ID: u8 = 0x22;
    pub const READ_MEMORY_BY_ADDRESS: u8 = 0x23;
    pub const WRITE_MEMORY_BY_ADDRESS: u8 = 0x3D;
    pub const NEGATIVE_RESPONSE: u8 = 0x7F;
}

/// Offset added to a service ID to form its positive response SID
pub const POSITIVE_RESPONSE_OFFSET: u8 = 0x40;

/// Largest address expressible in the 3-byte address field
pub const MAX_ADDRESS: u32 = 0x00FF_FFFF;

/// Create a positive response for a service
pub fn positive_response(service_id: u8, data: &[u8]) -> Vec<u8> {
    let mut response = Vec::with_capacity(1 + data.len());
    response.push(service_id.wrapping_add(POSITIVE_RESPONSE_OFFSET));
    response.extend_from_slice(data);
    response
}

/// Create a negative response
pub fn negative_response(service_id: u8, nrc: u8) -> Vec<u8> {
    vec![service_id::NEGATIVE_RESPONSE, service_id, nrc]
}

/// Response to a request that carried no service ID at all.
///
/// Only two bytes long: there is no SID to echo and no NRC is assigned.
pub fn general_reject() -> Vec<u8> {
    vec![service_id::NEGATIVE_RESPONSE, 0x00]
}

/// Decode a 3-byte big-endian address field
pub fn decode_address(bytes: [u8; 3]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}

/// Encode an address into the 3-byte big-endian field, if it fits
pub fn encode_address(address: u32) -> Option<[u8; 3]> {
    if address > MAX_ADDRESS {
        return None;
    }
    let [_, hi, mid, lo] = address.to_be_bytes();
    Some([hi, mid, lo])
}

/// Build a ReadMemoryByAddress request
pub fn read_memory_request(address: u32, length: u8) -> Option<Vec<u8>> {
    let addr = encode_address(address)?;
    let mut request = vec![service_id::READ_MEMORY_BY_ADDRESS];
    request.extend_from_slice(&addr);
    request.push(length);
    Some(request)
}

/// Build a WriteMemoryByAddress request
pub fn write_memory_request(address: u32, data: &[u8]) -> Option<Vec<u8>> {
    let addr = encode_address(address)?;
    let mut request = Vec::with_capacity(4 + data.len());
    request.push(service_id::WRITE_MEMORY_BY_ADDRESS);
    request.extend_from_slice(&addr);
    request.extend_from_slice(data);
    Some(request)
}

/// Build an ECUReset request
pub fn ecu_reset_request() -> Vec<u8> {
    vec![service_id::ECU_RESET]
}

/// Build a ReadDataByIdentifier request
pub fn read_data_by_id_request(did: u16) -> Vec<u8> {
    let [hi, lo] = did.to_be_bytes();
    vec![service_id::READ_DATA_BY_ID, hi, lo]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_framing() {
        assert_eq!(positive_response(0x23, &[0xAA]), vec![0x63, 0xAA]);
        assert_eq!(positive_response(0x11, &[]), vec![0x51]);
        assert_eq!(negative_response(0x22, 0x31), vec![0x7F, 0x22, 0x31]);
        assert_eq!(general_reject(), vec![0x7F, 0x00]);
    }

    #[test]
    fn address_field_is_big_endian() {
        assert_eq!(decode_address([0x0F, 0xFF, 0xFF]), 0x0F_FFFF);
        assert_eq!(encode_address(0x01_2345), Some([0x01, 0x23, 0x45]));
        assert_eq!(encode_address(0x0100_0000), None);
    }

    #[test]
    fn request_builders() {
        assert_eq!(
            read_memory_request(0x1000, 3),
            Some(vec![0x23, 0x00, 0x10, 0x00, 0x03])
        );
        assert_eq!(
            write_memory_request(0x2000, &[0x05, 0x06]),
            Some(vec![0x3D, 0x00, 0x20, 0x00, 0x05, 0x06])
        );
        assert_eq!(read_data_by_id_request(0xF100), vec![0x22, 0xF1, 0x00]);
        assert_eq!(ecu_reset_request(), vec![0x11]);
        assert!(read_memory_request(0x0100_0000, 1).is_none());
    }
}
