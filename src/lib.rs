//! A framed, retry-driven engine for the XMODEM and XMODEM-CRC
//! file-transfer protocols, with an optional DLE-escape transparency
//! layer, targeting byte-oriented serial links on small embedded
//! targets.
//!
//! The engine is single-threaded and cooperatively blocking: a
//! `send`/`receive` call occupies the calling thread for the duration of
//! the transfer, suspending only inside the [`Transport`]'s `read_byte`.
//! There is no task scheduling, no shared mutable state between
//! sessions, and no allocation on the hot path - a [`Config`] and a
//! session-owned [`diag::RingLog`] are the only state carried between
//! calls.
#![cfg_attr(not(feature = "std"), no_std)]

pub mod checksum;
pub mod config;
pub mod diag;
pub mod error;
pub mod frame;
mod session;
pub mod transport;

pub use config::{Config, LogLevel, Mode};
pub use diag::LogLine;
pub use error::{Error, Result};
pub use transport::{ReadResult, Transport};

#[cfg(feature = "std")]
pub use transport::IoTransport;

use diag::RingLog;

/// The public façade (§6.3): configures a session and drives either role
/// to completion over a caller-supplied [`Transport`].
pub struct Xmodem {
	config: Config,
	log: RingLog,
}

impl Default for Xmodem {
	fn default() -> Self {
		Self::new()
	}
}

impl Xmodem {
	/// Creates an engine with the default configuration (§4.5's defaults,
	/// CRC mode, no escaping, `Warning` log level).
	pub fn new() -> Self {
		Self::with_config(Config::default())
	}

	/// Creates an engine with an explicit configuration, per §9's
	/// "expose as an immutable value supplied at construction."
	pub fn with_config(config: Config) -> Self {
		Xmodem {
			log: RingLog::new(config.log_level),
			config,
		}
	}

	/// Replaces the whole configuration. Mid-session reconfiguration is
	/// undefined; call this only between transfers.
	pub fn configure(&mut self, config: Config) {
		self.log.set_level(config.log_level);
		self.config = config;
	}

	/// Shorthand for the two canonical configurations: `Original`
	/// (additive checksum, no CRC requirement) or `Crc` (CRC-16/XMODEM,
	/// required).
	pub fn set_mode(&mut self, mode: Mode) {
		self.config = self.config.with_mode(mode);
	}

	pub fn set_log_level(&mut self, level: LogLevel) {
		self.config.log_level = level;
		self.log.set_level(level);
	}

	pub fn set_escaping(&mut self, use_escape: bool) {
		self.config.use_escape = use_escape;
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Diagnostic lines recorded during the most recent `send`/`receive`
	/// call (§2.6, §11), oldest first.
	pub fn drain_log(&self) -> impl Iterator<Item = &LogLine> {
		self.log.entries()
	}

	/// Sends `data` over `transport`. Only complete 128-byte blocks are
	/// transmitted; pre-pad `data` to a multiple of 128 with `0x1A` to
	/// deliver a trailing partial block. Returns whether the transfer was
	/// acknowledged end to end.
	pub fn send<T: Transport>(&mut self, transport: &mut T, data: &[u8]) -> bool {
		self.try_send(transport, data).is_ok()
	}

	/// As [`Xmodem::send`], but surfaces the specific failure kind (§7)
	/// instead of collapsing it to a boolean.
	pub fn try_send<T: Transport>(&mut self, transport: &mut T, data: &[u8]) -> Result<usize> {
		session::sender::send(transport, &self.config, &mut self.log, data)
	}

	/// Receives into `buffer`, returning the number of bytes written
	/// (always a multiple of 128). Zero indicates failure or
	/// cancellation; detailed diagnostics are in [`Xmodem::drain_log`].
	pub fn receive<T: Transport>(&mut self, transport: &mut T, buffer: &mut [u8]) -> usize {
		self.try_receive(transport, buffer).unwrap_or(0)
	}

	/// As [`Xmodem::receive`], but surfaces the specific failure kind
	/// (§7) instead of collapsing it to zero.
	pub fn try_receive<T: Transport>(&mut self, transport: &mut T, buffer: &mut [u8]) -> Result<usize> {
		session::receiver::receive(transport, &self.config, &mut self.log, buffer)
	}
}
