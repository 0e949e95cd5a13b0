/// Result of a single byte read with a timeout.
///
/// The reference C++ this engine is descended from overloads a signed `int`
/// so that a timeout is `-1` and a byte is `0..255` read as unsigned -
/// which collides with the valid byte `0xFF` on platforms where `char` is
/// signed. A tagged variant removes the ambiguity entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadResult {
	Byte(u8),
	Timeout,
}

/// The capability the session state machines consume to talk to the link.
///
/// A session is handed a `&mut impl Transport` for the duration of a single
/// `send`/`receive` call and never retains it afterward. Implementations
/// range from a real UART driver to an in-memory channel pair used in
/// tests; the engine itself never opens or configures the transport.
pub trait Transport {
	/// Returns the next byte from the link, or `Timeout` if none arrives
	/// within `timeout_us` microseconds. Must not return a partial byte.
	fn read_byte(&mut self, timeout_us: u32) -> ReadResult;

	/// Enqueues a single byte for transmission, in the order called.
	/// Must not fail synchronously; back-pressure is the adapter's problem.
	fn write_byte(&mut self, byte: u8);

	/// Writes a sequence of bytes via repeated `write_byte` calls.
	fn write_bytes(&mut self, bytes: &[u8]) {
		for &b in bytes {
			self.write_byte(b);
		}
	}

	/// Drains incoming bytes until `timeout_us` elapses without receiving
	/// one. Used by the abort sequence (§4.4) to flush a cancelled peer's
	/// in-flight data before returning control to the caller.
	fn drain(&mut self, timeout_us: u32) {
		loop {
			if let ReadResult::Timeout = self.read_byte(timeout_us) {
				break;
			}
		}
	}
}

#[cfg(feature = "std")]
mod io_adapter {
	use super::{ReadResult, Transport};
	use std::io::{ErrorKind, Read, Write};

	/// Adapts any `Read + Write` byte stream (a serial port, a TCP socket, a
	/// pipe) into a [`Transport`].
	///
	/// The underlying stream is expected to already be configured with a
	/// per-read timeout (e.g. `serialport::SerialPort::set_timeout`) - this
	/// adapter has no portable way to impose one itself, the same
	/// limitation `awelkie-xmodem.rs` documents on its `send`/`recv`
	/// methods. `timeout_us` is accepted for interface parity but is
	/// otherwise advisory; a `std::io::ErrorKind::TimedOut` or
	/// `WouldBlock` from the stream is translated to `ReadResult::Timeout`.
	pub struct IoTransport<T> {
		inner: T,
	}

	impl<T> IoTransport<T> {
		pub fn new(inner: T) -> Self {
			IoTransport { inner }
		}

		pub fn into_inner(self) -> T {
			self.inner
		}
	}

	impl<T: Read + Write> Transport for IoTransport<T> {
		fn read_byte(&mut self, _timeout_us: u32) -> ReadResult {
			let mut buf = [0u8; 1];
			match self.inner.read_exact(&mut buf) {
				Ok(()) => ReadResult::Byte(buf[0]),
				Err(e)
					if e.kind() == ErrorKind::TimedOut
						|| e.kind() == ErrorKind::WouldBlock
						|| e.kind() == ErrorKind::UnexpectedEof =>
				{
					ReadResult::Timeout
				}
				Err(_) => ReadResult::Timeout,
			}
		}

		fn write_byte(&mut self, byte: u8) {
			let _ = self.inner.write_all(&[byte]);
		}
	}
}

#[cfg(feature = "std")]
pub use io_adapter::IoTransport;
