//! Session state machines (§4.3, §4.4): explicit sender and receiver FSMs
//! driving the NAK/ACK/CAN dialogue over a [`Transport`](crate::transport::Transport).

pub mod receiver;
pub mod sender;

use crate::diag::RingLog;
use crate::frame::CAN;
use crate::transport::Transport;

/// Abort sequence (§4.4): emit CAN `can_count` times, then drain any
/// further incoming bytes until `drain_timeout_us` elapses without
/// receipt. Used by both roles on any fatal, peer-may-be-mid-transfer
/// failure.
pub(crate) fn abort<T: Transport>(transport: &mut T, log: &mut RingLog, can_count: u8, drain_timeout_us: u32) {
	log.warning(format_args!("aborting: sending CAN x{}", can_count));
	for _ in 0..can_count {
		transport.write_byte(CAN);
	}
	transport.drain(drain_timeout_us);
}
