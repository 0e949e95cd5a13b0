//! Receiver state machine (§4.3 Receiver).

use crate::config::Config;
use crate::diag::RingLog;
use crate::error::{Error, Result};
use crate::frame::{decode_block, BLOCK_SIZE, ACK, CAN, CRC_INIT, DecodeOutcome, EOT, NAK, SOH};
use crate::session::abort;
use crate::transport::{ReadResult, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	Init,
	AwaitBlock,
	ReceivingBlock,
	Completed,
	Cancelled,
}

fn emit_initiation<T: Transport>(transport: &mut T, config: &Config) {
	if config.use_crc {
		transport.write_byte(CRC_INIT);
	} else {
		transport.write_byte(NAK);
	}
}

/// Drives a receive session to completion, returning the number of bytes
/// written into `buffer` (always a multiple of 128) or the kind of
/// failure that ended the session (§7, §10).
///
/// `buffer`'s length is the receiver's capacity (§6.3's `capacity`); a
/// block that would overflow it triggers the abort sequence rather than a
/// panic or a truncated copy.
pub fn receive<T: Transport>(transport: &mut T, config: &Config, log: &mut RingLog, buffer: &mut [u8]) -> Result<usize> {
	log.clear();
	log.set_level(config.log_level);
	log.info(format_args!(
		"starting receive, use_crc={}, escape={}",
		config.use_crc, config.use_escape
	));

	let mut state = State::Init;
	// Sequence byte carried on the wire, wraps mod 256 per §3 ("Sequence
	// wrap" in §8). Distinct from `blocks_accepted`, which is monotonic
	// and drives both the buffer offset and the final byte count -
	// the wire byte alone can't address buffers past 255 blocks.
	let mut seq_byte: u8 = 1;
	let mut blocks_accepted: usize = 0;
	let mut await_retries: u32 = 0;
	let mut failure: Error = Error::RetryExhausted;

	loop {
		state = match state {
			State::Init => {
				emit_initiation(transport, config);
				State::AwaitBlock
			}

			State::AwaitBlock => match transport.read_byte(config.wait_timeout_receiver_us) {
				ReadResult::Byte(SOH) => {
					await_retries = 0;
					State::ReceivingBlock
				}
				ReadResult::Byte(EOT) => {
					log.info(format_args!("EOT received, {} blocks accepted", blocks_accepted));
					transport.write_byte(ACK);
					State::Completed
				}
				ReadResult::Byte(CAN) => {
					log.info(format_args!("CAN received from peer"));
					transport.write_byte(ACK);
					failure = Error::PeerCancelled;
					State::Cancelled
				}
				ReadResult::Timeout => {
					await_retries += 1;
					if await_retries > config.block_retry_limit as u32 {
						log.error(format_args!("retry budget exhausted waiting for block {}", seq_byte));
						abort(transport, log, config.abort_can_count, config.read_timeout_receiver_us);
						failure = Error::RetryExhausted;
						State::Cancelled
					} else {
						if blocks_accepted == 0 {
							emit_initiation(transport, config);
						}
						State::AwaitBlock
					}
				}
				ReadResult::Byte(other) => {
					log.info(format_args!("unexpected byte {:#04x} while awaiting block", other));
					State::AwaitBlock
				}
			},

			State::ReceivingBlock => {
				let offset = blocks_accepted * BLOCK_SIZE;
				if offset + BLOCK_SIZE > buffer.len() {
					log.error(format_args!("incoming block would overflow {}-byte buffer", buffer.len()));
					abort(transport, log, config.abort_can_count, config.read_timeout_receiver_us);
					failure = Error::BufferOverflow;
					State::Cancelled
				} else {
					match decode_block(
						transport,
						seq_byte,
						config.use_crc,
						config.use_escape,
						config.read_timeout_receiver_us,
					) {
						DecodeOutcome::Ok { payload, .. } => {
							buffer[offset..offset + BLOCK_SIZE].copy_from_slice(&payload);
							transport.write_byte(ACK);
							log.debug(format_args!("block {} accepted", seq_byte));
							blocks_accepted += 1;
							seq_byte = seq_byte.wrapping_add(1);
							await_retries = 0;
							State::AwaitBlock
						}
						DecodeOutcome::BadHeader => {
							log.warning(format_args!("bad header for block {}", seq_byte));
							transport.write_byte(NAK);
							State::AwaitBlock
						}
						DecodeOutcome::BadChecksum => {
							log.warning(format_args!("bad checksum for block {}", seq_byte));
							transport.write_byte(NAK);
							State::AwaitBlock
						}
						DecodeOutcome::Timeout => {
							log.warning(format_args!("timeout mid-block {}", seq_byte));
							transport.write_byte(NAK);
							State::AwaitBlock
						}
					}
				}
			}

			State::Completed => {
				let total = blocks_accepted * BLOCK_SIZE;
				log.info(format_args!("receive complete, {} bytes", total));
				return Ok(total);
			}

			State::Cancelled => {
				log.warning(format_args!("receive cancelled"));
				return Err(failure);
			}
		};
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::LogLevel;
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
	fn overflow_triggers_abort_and_error() {
		let config = Config {
			block_retry_limit: 1,
			..Config::default()
		};
		let mut log = RingLog::new(LogLevel::Debug);
		let mut inp = VecDeque::new();
		inp.push_back(SOH);
		let mut t = VecTransport { out: Vec::new(), inp };
		let mut buffer = [0u8; 64]; // smaller than one block
		let result = receive(&mut t, &config, &mut log, &mut buffer);
		assert_eq!(result, Err(Error::BufferOverflow));
		assert!(t.out.iter().filter(|&&b| b == CAN).count() >= config.abort_can_count as usize);
	}

	#[test]
	fn peer_cancel_reports_peer_cancelled() {
		let config = Config::default();
		let mut log = RingLog::new(LogLevel::Debug);
		let mut inp = VecDeque::new();
		inp.push_back(CAN);
		let mut t = VecTransport { out: Vec::new(), inp };
		let mut buffer = [0u8; BLOCK_SIZE];
		assert_eq!(receive(&mut t, &config, &mut log, &mut buffer), Err(Error::PeerCancelled));
	}
}
