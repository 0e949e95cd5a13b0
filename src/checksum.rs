//! Stateless checksum arithmetic (§4.1).

/// 8-bit additive checksum: running sum modulo 256.
pub fn additive(data: &[u8]) -> u8 {
	data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// CRC-16/XMODEM: polynomial 0x1021, initial 0, no reflection, no final XOR.
///
/// Delegates to the `crc16` crate rather than hand-rolling the bit loop, to
/// guarantee byte-for-byte agreement with the rest of the XMODEM ecosystem
/// that also builds on it (`awelkie-xmodem.rs`, `shymega-txmodems`).
pub fn crc16_xmodem(data: &[u8]) -> u16 {
	crc16::State::<crc16::XMODEM>::calculate(data)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn additive_wraps_modulo_256() {
		assert_eq!(additive(&[0x00; 128]), 0);
		assert_eq!(additive(&[0xFF; 2]), 0xFE);
		assert_eq!(additive(&[0x01; 256]), 0);
	}

	#[test]
	fn additive_hello_world_padded() {
		let mut payload = [0x1Au8; 128];
		payload[..12].copy_from_slice(b"HELLO WORLD\n");
		let sum: u32 = b"HELLO WORLD\n".iter().map(|&b| b as u32).sum();
		let expected = ((sum + 116 * 0x1A) % 256) as u8;
		assert_eq!(additive(&payload), expected);
	}

	#[test]
	fn crc16_reference_vectors() {
		assert_eq!(crc16_xmodem(&[0x00; 128]), 0x0000);
		assert_eq!(crc16_xmodem(&[b'A'; 128]), 0x7E55);
	}
}
