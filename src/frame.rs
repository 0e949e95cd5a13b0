//! Frame codec (§4.2): a single 128-byte XMODEM block, with the optional
//! DLE-escape transparency layer applied only on decode.

use crate::checksum;
use crate::transport::{ReadResult, Transport};

pub const BLOCK_SIZE: usize = 128;

pub const SOH: u8 = 0x01;
pub const EOT: u8 = 0x04;
pub const ACK: u8 = 0x06;
pub const DLE: u8 = 0x10;
pub const NAK: u8 = 0x15;
pub const CAN: u8 = 0x18;
pub const SUB: u8 = 0x1A;
pub const CRC_INIT: u8 = b'C';

/// Outcome of decoding one block body (header has already been resolved
/// to `SOH` by the caller before `decode_block` is invoked).
pub enum DecodeOutcome {
	Ok { seq: u8, payload: [u8; BLOCK_SIZE] },
	BadHeader,
	BadChecksum,
	Timeout,
}

/// Encodes and transmits one 128-byte block: `[SOH][seq][0xFF-seq][payload][trailer]`.
/// No escaping is applied on send - escape is receive-side only (§4.2).
pub fn encode_block<T: Transport>(transport: &mut T, seq: u8, payload: &[u8; BLOCK_SIZE], use_crc: bool) {
	transport.write_byte(SOH);
	transport.write_byte(seq);
	transport.write_byte(0xFFu8.wrapping_sub(seq));
	transport.write_bytes(payload);

	if use_crc {
		let crc = checksum::crc16_xmodem(payload);
		transport.write_bytes(&crc.to_be_bytes());
	} else {
		transport.write_byte(checksum::additive(payload));
	}
}

/// Decodes one block body. The caller has already consumed the leading
/// `SOH` from the transport; this reads the remaining header byte, the
/// complement, the (possibly escaped) payload, and the checksum trailer.
///
/// `expected_seq` is the sequence byte the session is currently waiting
/// for; a mismatch is reported as `BadHeader` alongside a complement
/// mismatch, per §4.2 - both are recoverable with a NAK, not a fatal abort.
pub fn decode_block<T: Transport>(
	transport: &mut T,
	expected_seq: u8,
	use_crc: bool,
	use_escape: bool,
	read_timeout_us: u32,
) -> DecodeOutcome {
	let seq = match transport.read_byte(read_timeout_us) {
		ReadResult::Byte(b) => b,
		ReadResult::Timeout => return DecodeOutcome::Timeout,
	};
	let seq_complement = match transport.read_byte(read_timeout_us) {
		ReadResult::Byte(b) => b,
		ReadResult::Timeout => return DecodeOutcome::Timeout,
	};

	let mut payload = [0u8; BLOCK_SIZE];
	let mut i = 0;
	while i < BLOCK_SIZE {
		let mut byte = match transport.read_byte(read_timeout_us) {
			ReadResult::Byte(b) => b,
			ReadResult::Timeout => return DecodeOutcome::Timeout,
		};

		if use_escape && byte == DLE {
			byte = match transport.read_byte(read_timeout_us) {
				ReadResult::Byte(b) => b ^ 0x40,
				ReadResult::Timeout => return DecodeOutcome::Timeout,
			};
		}

		payload[i] = byte;
		i += 1;
	}

	let checksum_ok = if use_crc {
		let hi = match transport.read_byte(read_timeout_us) {
			ReadResult::Byte(b) => b,
			ReadResult::Timeout => return DecodeOutcome::Timeout,
		};
		let lo = match transport.read_byte(read_timeout_us) {
			ReadResult::Byte(b) => b,
			ReadResult::Timeout => return DecodeOutcome::Timeout,
		};
		checksum::crc16_xmodem(&payload) == u16::from_be_bytes([hi, lo])
	} else {
		let recv = match transport.read_byte(read_timeout_us) {
			ReadResult::Byte(b) => b,
			ReadResult::Timeout => return DecodeOutcome::Timeout,
		};
		checksum::additive(&payload) == recv
	};

	if seq_complement != 0xFFu8.wrapping_sub(seq) || seq != expected_seq {
		return DecodeOutcome::BadHeader;
	}

	if !checksum_ok {
		return DecodeOutcome::BadChecksum;
	}

	DecodeOutcome::Ok { seq, payload }
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::VecDeque;

	struct VecTransport {
		out: Vec<u8>,
		inp: VecDeque<u8>,
	}

	impl Transport for VecTransport {
		fn read_byte(&mut self, _timeout_us: u32) -> ReadResult {
			match self.inp.pop_front() {
				Some(b) => ReadResult::Byte(b),
				None => ReadResult::Timeout,
			}
		}

		fn write_byte(&mut self, byte: u8) {
			self.out.push(byte);
		}
	}

	#[test]
	fn encode_then_decode_crc_round_trips() {
		let payload = [0x42u8; BLOCK_SIZE];
		let mut t = VecTransport { out: Vec::new(), inp: VecDeque::new() };
		encode_block(&mut t, 1, &payload, true);

		// Drop the leading SOH the way the session loop already would.
		let mut body: VecDeque<u8> = t.out.into_iter().collect();
		assert_eq!(body.pop_front(), Some(SOH));

		let mut t2 = VecTransport { out: Vec::new(), inp: body };
		match decode_block(&mut t2, 1, true, false, 1_000) {
			DecodeOutcome::Ok { seq, payload: p } => {
				assert_eq!(seq, 1);
				assert_eq!(p, payload);
			}
			_ => panic!("expected Ok"),
		}
	}

	#[test]
	fn escape_unwraps_dle_xor_40() {
		// Payload byte 0x01 transmitted as DLE, 0x01 ^ 0x40.
		let mut inp = VecDeque::new();
		inp.push_back(1u8); // seq
		inp.push_back(0xFEu8); // complement
		inp.push_back(DLE);
		inp.push_back(0x01 ^ 0x40);
		for _ in 1..BLOCK_SIZE {
			inp.push_back(0x00);
		}
		let mut payload = [0u8; BLOCK_SIZE];
		payload[0] = 0x01;
		inp.push_back(checksum::additive(&payload));

		let mut t = VecTransport { out: Vec::new(), inp };
		match decode_block(&mut t, 1, false, true, 1_000) {
			DecodeOutcome::Ok { payload: p, .. } => assert_eq!(p, payload),
			_ => panic!("expected Ok"),
		}
	}

	#[test]
	fn bad_header_detected() {
		let mut inp = VecDeque::new();
		inp.push_back(1u8);
		inp.push_back(0x00u8); // wrong complement
		for _ in 0..BLOCK_SIZE {
			inp.push_back(0);
		}
		inp.push_back(checksum::additive(&[0u8; BLOCK_SIZE]));
		let mut t = VecTransport { out: Vec::new(), inp };
		assert!(matches!(decode_block(&mut t, 1, false, false, 1_000), DecodeOutcome::BadHeader));
	}

	#[test]
	fn bad_checksum_detected() {
		let mut inp = VecDeque::new();
		inp.push_back(1u8);
		inp.push_back(0xFEu8);
		for _ in 0..BLOCK_SIZE {
			inp.push_back(0);
		}
		inp.push_back(0xFF); // wrong checksum
		let mut t = VecTransport { out: Vec::new(), inp };
		assert!(matches!(decode_block(&mut t, 1, false, false, 1_000), DecodeOutcome::BadChecksum));
	}
}
