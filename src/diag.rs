//! Diagnostic sink (§2.6, §11).
//!
//! Every state transition, retry, and abort is logged twice: once through
//! the `log` crate's leveled macros (a no-op unless a backend is wired up
//! by the caller), and once into a fixed-capacity ring buffer owned by the
//! session, which needs no allocator and survives even when nothing is
//! listening on the `log` facade - the common case on bare-metal firmware
//! with no logging backend at all. Both receive the same messages; the
//! ring is the fallback, not a replacement.

use crate::config::LogLevel;
use core::fmt::{self, Write as _};
use heapless::{Deque, String};

/// Maximum characters per recorded line. Longer formatted messages are
/// truncated by `heapless::String`'s `write!` once the capacity is hit.
const LINE_CAPACITY: usize = 72;

/// Maximum number of lines retained; oldest lines are dropped first once
/// the ring fills, per §2.6's "leveled append-only ring/linear buffer".
const RING_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct LogLine {
	pub level: LogLevel,
	pub text: String<LINE_CAPACITY>,
}

pub struct RingLog {
	level: LogLevel,
	lines: Deque<LogLine, RING_CAPACITY>,
}

impl RingLog {
	pub fn new(level: LogLevel) -> Self {
		RingLog {
			level,
			lines: Deque::new(),
		}
	}

	pub fn set_level(&mut self, level: LogLevel) {
		self.level = level;
	}

	/// Clears the ring without affecting the `log` crate facade.
	pub fn clear(&mut self) {
		self.lines.clear();
	}

	/// Iterates recorded lines oldest-first, draining nothing; call
	/// `clear()` afterward if the caller wants a fresh ring for the next
	/// session. `Xmodem::send`/`receive` call `clear()` on entry, so a
	/// session's log reflects only that session by the time it returns.
	pub fn entries(&self) -> impl Iterator<Item = &LogLine> {
		self.lines.iter()
	}

	fn push(&mut self, level: LogLevel, text: String<LINE_CAPACITY>) {
		if self.lines.is_full() {
			self.lines.pop_front();
		}
		let _ = self.lines.push_back(LogLine { level, text });
	}

	/// Records a message at `level` through both sinks, subject to the
	/// configured `log_level` filter (lower enum value = higher priority,
	/// matching the C++ source's `is_log_level`: a message is kept when
	/// `level <= self.level`).
	pub fn record(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
		if level > self.level {
			return;
		}

		log_to_facade(level, args);

		let mut text: String<LINE_CAPACITY> = String::new();
		let _ = text.write_fmt(args);
		self.push(level, text);
	}
}

fn log_to_facade(level: LogLevel, args: fmt::Arguments<'_>) {
	let log_level = match level {
		LogLevel::Fatal | LogLevel::Error => log::Level::Error,
		LogLevel::Warning => log::Level::Warn,
		LogLevel::Info => log::Level::Info,
		LogLevel::Debug => log::Level::Debug,
	};
	log::log!(log_level, "{}", args);
}

/// Convenience macros mirroring the five XLogLevel variants, used
/// throughout the session state machines in place of bare `record` calls.
macro_rules! diag_level_fn {
	($name:ident, $level:expr) => {
		impl RingLog {
			pub fn $name(&mut self, args: fmt::Arguments<'_>) {
				self.record($level, args);
			}
		}
	};
}

diag_level_fn!(fatal, LogLevel::Fatal);
diag_level_fn!(error, LogLevel::Error);
diag_level_fn!(warning, LogLevel::Warning);
diag_level_fn!(info, LogLevel::Info);
diag_level_fn!(debug, LogLevel::Debug);
