//! CRC16/CCITT-FALSE as required by EMVCo tag 63.

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

/// Header of the checksum record: tag 63, length 04.
pub const CHECKSUM_HEADER: &str = "6304";

/// Computes the raw CRC16/CCITT-FALSE register over `data`.
pub fn crc16_ccitt_false(data: &[u8]) -> u16 {
    let mut crc = INIT;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Four uppercase hex digits over the bytes of `input`.
pub fn checksum(input: &str) -> String {
    format!("{:04X}", crc16_ccitt_false(input.as_bytes()))
}

/// Returns true when `payload` ends in a checksum record whose digest matches
/// everything before it.
pub fn verify(payload: &str) -> bool {
    let Some(split) = payload.len().checked_sub(4) else {
        return false;
    };
    if !payload.is_char_boundary(split) {
        return false;
    }
    let (covered, digest) = payload.split_at(split);
    covered.ends_with(CHECKSUM_HEADER) && digest.eq_ignore_ascii_case(&checksum(covered))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vector() {
        assert_eq!(crc16_ccitt_false(b"123456789"), 0x29B1);
        assert_eq!(checksum("123456789"), "29B1");
    }

    #[test]
    fn test_empty_input_is_initial_register() {
        assert_eq!(checksum(""), "FFFF");
    }

    #[test]
    fn test_checksum_is_zero_padded() {
        for input in ["A", "00020101021126", "6304", "5303360"] {
            let digest = checksum(input);
            assert_eq!(digest.len(), 4);
            assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_checksum_is_deterministic() {
        let input = "00020101021253033605802ID6304";
        assert_eq!(checksum(input), checksum(input));
    }

    #[test]
    fn test_verify() {
        let body = "00020101021153033605802ID6304";
        let payload = format!("{}{}", body, checksum(body));
        assert!(verify(&payload));
        assert!(verify(&format!("{}{}", body, checksum(body).to_lowercase())));

        let tampered = payload.replace("5802ID", "5802IE");
        assert!(!verify(&tampered));
        assert!(!verify("630"));
        assert!(!verify("000201"));
    }
}
