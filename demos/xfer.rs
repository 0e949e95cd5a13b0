//! Manual smoke-test front end: wires a real serial port to the engine
//! via `IoTransport`, in the style of `TGMM-xymodem.rs`'s `src/test.rs`.
//! Not part of the tested library surface - run by hand against a second
//! XMODEM endpoint (another copy of this binary, a terminal emulator's
//! file transfer, `sx`/`rx`, etc.) when a real link is available.
//!
//! ```text
//! xfer send --port /dev/ttyUSB0 --baud 115200 path/to/file
//! xfer recv --port /dev/ttyUSB0 --baud 115200 path/to/output
//! ```

use std::fs;
use std::process::ExitCode;
use std::time::Duration;

use xmodem_engine::{Config, IoTransport, LogLevel, Mode, Xmodem};

const BLOCK_SIZE: usize = 128;
const MAX_RECEIVE_BYTES: usize = 16 * 1024 * 1024;

struct Args {
	role: Role,
	port: String,
	baud: u32,
	path: String,
}

enum Role {
	Send,
	Recv,
}

fn parse_args() -> Result<Args, String> {
	let mut raw = std::env::args().skip(1);
	let role = match raw.next().as_deref() {
		Some("send") => Role::Send,
		Some("recv") => Role::Recv,
		_ => return Err("first argument must be `send` or `recv`".into()),
	};

	let mut port = None;
	let mut baud = 115_200u32;
	let mut path = None;
	while let Some(arg) = raw.next() {
		match arg.as_str() {
			"--port" => port = raw.next(),
			"--baud" => baud = raw.next().and_then(|s| s.parse().ok()).ok_or("--baud expects a number")?,
			other if path.is_none() => path = Some(other.to_string()),
			other => return Err(format!("unrecognized argument: {other}")),
		}
	}

	Ok(Args {
		role,
		port: port.ok_or("missing --port <device>")?,
		baud,
		path: path.ok_or("missing file path")?,
	})
}

fn run() -> Result<(), String> {
	let args = parse_args()?;
	env_logger::init();

	let serial = serialport::new(&args.port, args.baud)
		.timeout(Duration::from_millis(500))
		.open()
		.map_err(|e| format!("failed to open {}: {e}", args.port))?;
	let mut transport = IoTransport::new(serial);

	let config = Config::default().with_mode(Mode::Crc);
	let mut engine = Xmodem::with_config(Config { log_level: LogLevel::Info, ..config });

	match args.role {
		Role::Send => {
			let mut data = fs::read(&args.path).map_err(|e| format!("failed to read {}: {e}", args.path))?;
			let rem = data.len() % BLOCK_SIZE;
			if rem != 0 {
				data.extend(std::iter::repeat(0x1Au8).take(BLOCK_SIZE - rem));
			}
			println!("sending {} bytes ({} blocks)...", data.len(), data.len() / BLOCK_SIZE);
			match engine.try_send(&mut transport, &data) {
				Ok(sent) => println!("delivered {sent} bytes"),
				Err(e) => {
					for line in engine.drain_log() {
						eprintln!("[{}] {}", line.level.name(), line.text);
					}
					return Err(format!("send failed: {e}"));
				}
			}
		}
		Role::Recv => {
			let mut buffer = vec![0u8; MAX_RECEIVE_BYTES];
			println!("waiting for sender...");
			match engine.try_receive(&mut transport, &mut buffer) {
				Ok(received) => {
					fs::write(&args.path, &buffer[..received]).map_err(|e| format!("failed to write {}: {e}", args.path))?;
					println!("received {received} bytes, wrote {}", args.path);
				}
				Err(e) => {
					for line in engine.drain_log() {
						eprintln!("[{}] {}", line.level.name(), line.text);
					}
					return Err(format!("receive failed: {e}"));
				}
			}
		}
	}

	Ok(())
}

fn main() -> ExitCode {
	match run() {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("error: {e}");
			ExitCode::FAILURE
		}
	}
}
