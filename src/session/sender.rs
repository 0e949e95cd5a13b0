//! Sender state machine (§4.3 Sender).

use crate::config::Config;
use crate::diag::RingLog;
use crate::error::{Error, Result};
use crate::frame::{encode_block, BLOCK_SIZE, ACK, CAN, CRC_INIT, EOT, NAK};
use crate::session::abort;
use crate::transport::{ReadResult, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	AwaitInitiation,
	SendingBlock,
	SendingEOT,
	Completed,
	Failed,
}

/// Converts the sender's wall-clock `wait_timeout_sender_ms` budget into a
/// bounded attempt count against the per-byte `read_timeout_sender_us`.
/// The engine has no clock of its own (§1: platform timekeeping is an
/// external collaborator) - this is the systems-language substitute for
/// "poll until this many milliseconds have elapsed."
fn initiation_attempts(config: &Config) -> u32 {
	let budget_us = config.wait_timeout_sender_ms as u64 * 1_000;
	let per_attempt_us = config.read_timeout_sender_us.max(1) as u64;
	((budget_us / per_attempt_us).max(1)) as u32
}

/// Drives a send session to completion, returning the number of bytes
/// transmitted (always `floor(data.len() / 128) * 128`) or the kind of
/// failure that ended the session (§7, §10).
///
/// `data`'s length need not be a multiple of 128; only complete blocks are
/// transmitted (§4.3's "Block iteration"), so the caller must pre-pad if
/// the trailing partial block should be delivered.
pub fn send<T: Transport>(transport: &mut T, config: &Config, log: &mut RingLog, data: &[u8]) -> Result<usize> {
	log.clear();
	log.set_level(config.log_level);
	log.info(format_args!("starting send, {} bytes", data.len()));

	let total_blocks = data.len() / BLOCK_SIZE;
	let mut state = State::AwaitInitiation;
	let mut use_crc_effective = config.use_crc;
	let mut seq_byte: u8 = 1;
	let mut next_block: usize = 0;
	let mut block_attempts: u8 = 0;
	let mut eot_attempts: u8 = 0;
	let mut failure: Error = Error::RetryExhausted;

	loop {
		state = match state {
			State::AwaitInitiation => {
				let max_attempts = initiation_attempts(config);
				let mut resolved = None;
				for _ in 0..max_attempts {
					match transport.read_byte(config.read_timeout_sender_us) {
						ReadResult::Byte(CRC_INIT) => {
							log.info(format_args!("CRC requested by receiver"));
							resolved = Some(true);
							break;
						}
						ReadResult::Byte(NAK) => {
							if config.use_crc && config.require_crc {
								log.error(format_args!("receiver requested additive checksum but CRC is required"));
								failure = Error::ModeMismatch;
								resolved = None;
								break;
							}
							log.info(format_args!("additive checksum requested by receiver"));
							resolved = Some(false);
							break;
						}
						ReadResult::Byte(other) => {
							log.debug(format_args!("unexpected byte {:#04x} awaiting initiation", other));
						}
						ReadResult::Timeout => {}
					}
				}

				match resolved {
					Some(use_crc) => {
						use_crc_effective = use_crc;
						State::SendingBlock
					}
					None => {
						if failure == Error::RetryExhausted {
							log.error(format_args!("timed out waiting for receiver initiation"));
							failure = Error::Timeout;
						}
						State::Failed
					}
				}
			}

			State::SendingBlock => {
				if next_block >= total_blocks {
					State::SendingEOT
				} else {
					let start = next_block * BLOCK_SIZE;
					let mut payload = [0u8; BLOCK_SIZE];
					payload.copy_from_slice(&data[start..start + BLOCK_SIZE]);

					encode_block(transport, seq_byte, &payload, use_crc_effective);
					log.debug(format_args!("sent block {} (attempt {})", seq_byte, block_attempts + 1));

					match transport.read_byte(config.read_timeout_sender_us) {
						ReadResult::Byte(ACK) => {
							log.debug(format_args!("ACK for block {}", seq_byte));
							next_block += 1;
							seq_byte = seq_byte.wrapping_add(1);
							block_attempts = 0;
							State::SendingBlock
						}
						ReadResult::Byte(CAN) => {
							if let ReadResult::Byte(CAN) = transport.read_byte(config.read_timeout_sender_us) {
								log.warning(format_args!("peer cancelled transfer"));
								failure = Error::PeerCancelled;
								State::Failed
							} else {
								block_attempts += 1;
								retry_or_fail(block_attempts, config.block_retry_limit, seq_byte, log, &mut failure)
							}
						}
						ReadResult::Byte(other) => {
							log.warning(format_args!("expected ACK for block {}, got {:#04x}", seq_byte, other));
							block_attempts += 1;
							retry_or_fail(block_attempts, config.block_retry_limit, seq_byte, log, &mut failure)
						}
						ReadResult::Timeout => {
							log.warning(format_args!("timeout waiting for ACK of block {}", seq_byte));
							block_attempts += 1;
							retry_or_fail(block_attempts, config.block_retry_limit, seq_byte, log, &mut failure)
						}
					}
				}
			}

			State::SendingEOT => {
				transport.write_byte(EOT);
				match transport.read_byte(config.read_timeout_sender_us) {
					ReadResult::Byte(ACK) => State::Completed,
					ReadResult::Byte(CAN) => {
						if let ReadResult::Byte(CAN) = transport.read_byte(config.read_timeout_sender_us) {
							log.warning(format_args!("peer cancelled during EOT"));
							failure = Error::PeerCancelled;
							State::Failed
						} else {
							eot_attempts += 1;
							eot_retry_or_fail(eot_attempts, config.eot_retry_limit, log, &mut failure)
						}
					}
					_ => {
						eot_attempts += 1;
						eot_retry_or_fail(eot_attempts, config.eot_retry_limit, log, &mut failure)
					}
				}
			}

			State::Completed => {
				let total = total_blocks * BLOCK_SIZE;
				log.info(format_args!("send complete, {} blocks", total_blocks));
				return Ok(total);
			}

			State::Failed => {
				abort(transport, log, config.abort_can_count, config.read_timeout_sender_us);
				return Err(failure);
			}
		};
	}
}

fn retry_or_fail(attempts: u8, limit: u8, seq: u8, log: &mut RingLog, failure: &mut Error) -> State {
	if attempts >= limit {
		log.error(format_args!("retry budget exhausted for block {}", seq));
		*failure = Error::RetryExhausted;
		State::Failed
	} else {
		State::SendingBlock
	}
}

fn eot_retry_or_fail(attempts: u8, limit: u8, log: &mut RingLog, failure: &mut Error) -> State {
	if attempts >= limit {
		log.error(format_args!("EOT Timeout"));
		*failure = Error::RetryExhausted;
		State::Failed
	} else {
		State::SendingEOT
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
	fn require_crc_fails_on_nak() {
		let config = Config {
			use_crc: true,
			require_crc: true,
			..Config::default()
		};
		let mut log = RingLog::new(LogLevel::Debug);
		let mut inp = VecDeque::new();
		inp.push_back(NAK);
		let mut t = VecTransport { out: Vec::new(), inp };
		let data = [0u8; BLOCK_SIZE];
		assert_eq!(send(&mut t, &config, &mut log, &data), Err(Error::ModeMismatch));
	}

	#[test]
	fn retry_budget_exhausted_on_all_nak() {
		let config = Config {
			block_retry_limit: 3,
			..Config::default()
		};
		let mut log = RingLog::new(LogLevel::Debug);
		let mut inp = VecDeque::new();
		inp.push_back(CRC_INIT);
		for _ in 0..3 {
			inp.push_back(NAK);
		}
		let mut t = VecTransport { out: Vec::new(), inp };
		let data = [0u8; BLOCK_SIZE];
		assert_eq!(send(&mut t, &config, &mut log, &data), Err(Error::RetryExhausted));
	}

	#[test]
	fn single_block_completes_on_ack() {
		let config = Config::default();
		let mut log = RingLog::new(LogLevel::Debug);
		let mut inp = VecDeque::new();
		inp.push_back(CRC_INIT);
		inp.push_back(ACK); // block 1
		inp.push_back(ACK); // EOT
		let mut t = VecTransport { out: Vec::new(), inp };
		let data = [0xAAu8; BLOCK_SIZE];
		assert_eq!(send(&mut t, &config, &mut log, &data), Ok(BLOCK_SIZE));
	}
}
