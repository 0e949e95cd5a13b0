use core::fmt;

/// The result type used throughout the engine.
pub type Result<T> = core::result::Result<T, Error>;

/// Error taxonomy for a send/receive session.
///
/// These are kinds, not wrapped causes: every variant here is something the
/// engine itself decided (a retry budget ran out, a peer cancelled, a frame
/// didn't check out), not a transport failure. `Transport::write_byte` is
/// defined to never fail synchronously and `Transport::read_byte` reports
/// timeouts through `ReadResult` rather than an `Err`, so there is no
/// `Io` variant to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	/// No byte arrived within the configured window.
	Timeout,

	/// A block's header sequence or checksum trailer didn't check out.
	BadFrame,

	/// Two consecutive CAN bytes were received from the peer.
	PeerCancelled,

	/// Incoming data would exceed the caller-supplied buffer.
	BufferOverflow,

	/// Sender requires CRC but the peer only offered the additive checksum.
	ModeMismatch,

	/// A per-block or per-EOT retry budget was exhausted.
	RetryExhausted,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let msg = match self {
			Error::Timeout => "timed out waiting for a byte",
			Error::BadFrame => "bad block header or checksum",
			Error::PeerCancelled => "peer sent CAN CAN",
			Error::BufferOverflow => "incoming data exceeds buffer capacity",
			Error::ModeMismatch => "peer does not support required CRC mode",
			Error::RetryExhausted => "retry budget exhausted",
		};
		f.write_str(msg)
	}
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
