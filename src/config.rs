//! Configuration and mode selection (§2.5, §12).

/// Checksum/mode shorthand exposed through `set_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
	/// 8-bit additive checksum, no CRC requirement.
	Original,
	/// CRC-16/XMODEM, and require the peer to support it.
	Crc,
}

/// Log levels, ordered from least to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
	Fatal,
	Error,
	Warning,
	Info,
	Debug,
}

impl LogLevel {
	pub fn name(self) -> &'static str {
		match self {
			LogLevel::Fatal => "Fatal",
			LogLevel::Error => "Error",
			LogLevel::Warning => "Warning",
			LogLevel::Info => "Info",
			LogLevel::Debug => "Debug",
		}
	}
}

/// Immutable configuration supplied at construction (§9: "expose as an
/// immutable value supplied at construction, plus explicit setters for the
/// mutable knobs"). The timing and retry fields are the defaults of §4.5;
/// they are changed only by replacing the whole `Config` via `configure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
	/// If true, trailer is 16-bit CRC-16/XMODEM; otherwise 8-bit additive.
	pub use_crc: bool,
	/// Sender refuses to fall back to additive checksum on a NAK start.
	pub require_crc: bool,
	/// Receiver decodes DLE (0x10) as an escape prefix (payload XOR 0x40).
	pub use_escape: bool,
	/// Filters which diagnostic messages are recorded/emitted.
	pub log_level: LogLevel,

	/// Wall-clock budget, in milliseconds, for the sender to see the first
	/// 'C'/NAK from the receiver.
	pub wait_timeout_sender_ms: u32,
	/// Per-byte read timeout, in microseconds, while the sender polls for
	/// a block/EOT response.
	pub read_timeout_sender_us: u32,
	/// Per-byte read timeout, in microseconds, while the receiver awaits
	/// SOH/EOT between blocks.
	pub wait_timeout_receiver_us: u32,
	/// Per-byte read timeout, in microseconds, for intra-block reads.
	pub read_timeout_receiver_us: u32,

	/// Attempts per block before the sender gives up.
	pub block_retry_limit: u8,
	/// EOT re-emissions before the sender gives up.
	pub eot_retry_limit: u8,
	/// Number of CAN bytes emitted by the abort sequence (§4.4).
	pub abort_can_count: u8,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			use_crc: true,
			require_crc: false,
			use_escape: false,
			log_level: LogLevel::Warning,

			wait_timeout_sender_ms: 30_000,
			read_timeout_sender_us: 10_000,
			wait_timeout_receiver_us: 3_000_000,
			read_timeout_receiver_us: 10_000,

			block_retry_limit: 10,
			eot_retry_limit: 10,
			abort_can_count: 8,
		}
	}
}

impl Config {
	pub fn new() -> Self {
		Self::default()
	}

	/// Applies the checksum/CRC-requirement pair that `set_mode` exposes.
	pub fn with_mode(mut self, mode: Mode) -> Self {
		match mode {
			Mode::Crc => {
				self.use_crc = true;
				self.require_crc = true;
			}
			Mode::Original => {
				self.use_crc = false;
				self.require_crc = false;
			}
		}
		self
	}
}
