//! Checksum utilities
//!
//! - Sensirion style CRC-8 (polynomial 0x31, init 0xFF) for the SEN50
//! - TE HTU31 CRC-8 (polynomial 0x31, init 0x00)
//! - MiCS-VZ-89TE sum-with-carry complement
//! - NMEA XOR checksum for positioning sentences

/// CRC-8 polynomial shared by the SEN50 and HTU31 (x^8 + x^5 + x^4 + 1)
pub const CRC8_POLY: u8 = 0x31;

/// Generic MSB-first CRC-8 without reflection or final XOR
pub fn crc8(data: &[u8], poly: u8, init: u8) -> u8 {
    let mut crc = init;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ poly
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// CRC for one Sensirion data word
pub fn sensirion_crc8(data: &[u8]) -> u8 {
    crc8(data, CRC8_POLY, 0xFF)
}

/// CRC for one HTU31 data word
pub fn htu31_crc8(data: &[u8]) -> u8 {
    crc8(data, CRC8_POLY, 0x00)
}

/// MiCS checksum: 8-bit sum with the carry added back in, then complemented
pub fn mics_checksum(data: &[u8]) -> u8 {
    let sum: u16 = data.iter().map(|&b| b as u16).sum();
    let folded = (sum as u8).wrapping_add((sum >> 8) as u8);
    0xFF - folded
}

/// XOR of every byte in an NMEA sentence body (between `$` and `*`)
pub fn nmea_checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, &b| acc ^ b)
}

/// Parse a two-digit hex checksum field (either case)
pub fn parse_hex_byte(hex: &[u8]) -> Option<u8> {
    if hex.len() != 2 {
        return None;
    }
    let hi = hex_digit(hex[0])?;
    let lo = hex_digit(hex[1])?;
    Some((hi << 4) | lo)
}

/// Check a sentence body against its transmitted checksum digits
pub fn verify_sentence(body: &[u8], hex: &[u8]) -> bool {
    parse_hex_byte(hex) == Some(nmea_checksum(body))
}

/// Uppercase hex digits for a checksum byte
pub fn hex_digits(value: u8) -> [u8; 2] {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    [DIGITS[(value >> 4) as usize], DIGITS[(value & 0x0F) as usize]]
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RMC_BODY: &[u8] =
        b"GNRMC,135030.000,A,5626.2161,N,00922.2802,E,0.00,294.78,261124,,,A";

    #[test]
    fn test_sensirion_datasheet_vector() {
        assert_eq!(sensirion_crc8(&[0xBE, 0xEF]), 0x92);
        assert_eq!(sensirion_crc8(&[0x00, 0x7B]), 0x93);
    }

    #[test]
    fn test_htu31_init_zero() {
        assert_eq!(htu31_crc8(&[0x00, 0x00]), 0x00);
        assert_eq!(htu31_crc8(&[0x66, 0x66]), 0x12);
        assert_eq!(htu31_crc8(&[0x80, 0x00]), 0x23);
    }

    #[test]
    fn test_mics_status_command() {
        assert_eq!(mics_checksum(&[0x0C, 0x00, 0x00, 0x00, 0x00]), 0xF3);
        assert_eq!(mics_checksum(&[0x3D, 0x70, 0x00, 0x00, 0x00, 0x00]), 0x52);
    }

    #[test]
    fn test_mics_carry_folds_back() {
        // 0xFF + 0x02 = 0x101 -> 0x01 + 0x01 = 0x02 -> complement 0xFD
        assert_eq!(mics_checksum(&[0xFF, 0x02]), 0xFD);
    }

    #[test]
    fn test_nmea_known_sentence() {
        assert_eq!(nmea_checksum(RMC_BODY), 0x74);
        assert!(verify_sentence(RMC_BODY, b"74"));
        assert!(!verify_sentence(RMC_BODY, b"75"));
    }

    #[test]
    fn test_hex_either_case() {
        assert_eq!(parse_hex_byte(b"1f"), Some(0x1F));
        assert_eq!(parse_hex_byte(b"1F"), Some(0x1F));
        assert_eq!(parse_hex_byte(b"1"), None);
        assert_eq!(parse_hex_byte(b"1G"), None);
        assert_eq!(parse_hex_byte(b"123"), None);
    }

    #[test]
    fn test_hex_digits_uppercase() {
        assert_eq!(&hex_digits(0x1F), b"1F");
        assert_eq!(&hex_digits(0x00), b"00");
        assert_eq!(&hex_digits(0xAB), b"AB");
    }

    proptest! {
        #[test]
        fn test_recomputed_checksum_accepts(body in proptest::collection::vec(0x20u8..0x7F, 0..80)) {
            let hex = hex_digits(nmea_checksum(&body));
            prop_assert!(verify_sentence(&body, &hex));
        }

        #[test]
        fn test_single_byte_flip_rejects(
            body in proptest::collection::vec(0x20u8..0x7F, 1..80),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=0xFF,
        ) {
            let hex = hex_digits(nmea_checksum(&body));
            let mut corrupted = body.clone();
            let i = index.index(corrupted.len());
            corrupted[i] ^= flip;
            prop_assert!(!verify_sentence(&corrupted, &hex));
        }
    }
}
