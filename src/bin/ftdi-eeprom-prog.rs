#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate ftdi_eeprom_prog;
use ftdi_eeprom_prog::*;

use std::fs;
use std::io::{
	self,
	Write,
};
use std::process::exit;
use std::time::Duration;

use ftdi_eeprom_prog::eeprom::Eeprom;
use ftdi_eeprom_prog::programmer::{
	Config,
	Progress,
	Programmer,
};
use ftdi_eeprom_prog::transport::{
	Recorder,
	Transport,
};

// like strtol with base 0: "0x" hex, leading "0" octal, decimal otherwise
fn parse_number(s: &str) -> AResult<u64> {
	let s = s.trim();
	let result = if s.starts_with("0x") || s.starts_with("0X") {
		u64::from_str_radix(&s[2..], 16)
	} else if s.len() > 1 && s.starts_with('0') {
		u64::from_str_radix(&s[1..], 8)
	} else {
		s.parse::<u64>()
	};
	Ok(result?)
}

fn get_number(matches: &clap::ArgMatches, name: &str, max: u64) -> AResult<Option<u64>> {
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => return Ok(None),
	};
	let value = parse_number(param).and_then(|value| {
		ensure!(value <= max, "must be at most 0x{:x}", max);
		Ok(value)
	}).map_err(|e| {
		let msg = format!("invalid parameter {} ({:?}): {}", name, param, e);
		failure::Error::from(e.context(msg))
	})?;
	Ok(Some(value))
}

fn config_from(matches: &clap::ArgMatches) -> AResult<Config> {
	let mut config = Config::default();
	if let Some(v) = get_number(matches, "load", 0xffff)? {
		config.load_address = v as u16;
	}
	if let Some(v) = get_number(matches, "page", 0xffff)? {
		config.page_size = v as u16;
	}
	if let Some(v) = get_number(matches, "delay", u64::from(u32::max_value()))? {
		config.write_delay = Duration::from_micros(v);
	}
	if let Some(v) = get_number(matches, "divisor", 0xffff)? {
		config.clock_divisor = v as u16;
	}
	config.validate()?;
	Ok(config)
}

#[cfg(feature = "ftdi")]
fn open_device(matches: &clap::ArgMatches) -> AResult<Box<dyn Transport>> {
	use ftdi_eeprom_prog::transport::{
		DeviceSelector,
		FtdiTransport,
	};

	let mut selector = DeviceSelector::default();
	if let Some(v) = get_number(matches, "vid", 0xffff)? {
		selector.vendor = v as u16;
	}
	if let Some(v) = get_number(matches, "pid", 0xffff)? {
		selector.product = v as u16;
	}
	if let Some(v) = get_number(matches, "port", 3)? {
		selector.port = v as u8;
	}
	let device = FtdiTransport::open(selector).map_err(|e| {
		warn!("Opening can fail if the ftdi_sio kernel module is bound to the device");
		ErrorKind::DeviceOpenFailed.wrap(e)
	})?;
	Ok(Box::new(device))
}

#[cfg(not(feature = "ftdi"))]
fn open_device(_matches: &clap::ArgMatches) -> AResult<Box<dyn Transport>> {
	Err(ErrorKind::DeviceOpenFailed.wrap(format_err!("built without FTDI support (enable the \"ftdi\" feature)")))
}

fn open_transport(matches: &clap::ArgMatches) -> AResult<Box<dyn Transport>> {
	if matches.is_present("dry_run") {
		info!("Dry run: not touching any hardware");
		return Ok(Box::new(Recorder::new().default_response(0xff)));
	}
	open_device(matches)
}

struct ConsoleProgress;

impl Progress for ConsoleProgress {
	fn start(&mut self, load_address: u16) {
		println!("Start flash at address 0x{:04X}", load_address);
	}

	fn page(&mut self, _address: u16) {
		print!(".");
		let _ = io::stdout().flush();
	}

	fn finish(&mut self, end_address: u16) {
		println!("Done!");
		println!("End flash at address 0x{:04X}", end_address);
	}
}

fn program(matches: &clap::ArgMatches, config: Config) -> AResult<()> {
	let path = matches.value_of("FILE").unwrap_or_default();
	let file = fs::File::open(path).map_err(|e| {
		ErrorKind::InputUnavailable.wrap(format_err!("unable to open {:?}: {}", path, e))
	})?;

	let transport = open_transport(matches)?;
	let mut programmer = Programmer::new(transport, config);
	programmer.run(io::BufReader::new(file), &mut ConsoleProgress)?;
	Ok(())
}

fn dump(matches: &clap::ArgMatches, config: Config, count: usize) -> AResult<()> {
	let path = matches.value_of("FILE").unwrap_or_default();
	let mut data = vec![0u8; count];

	let mut eeprom = Eeprom::new(open_transport(matches)?);
	let result = eeprom.init(config.clock_divisor)
		.and_then(|()| eeprom.read_range(config.load_address, &mut data));
	if let Err(e) = eeprom.reset() {
		error!("Couldn't return device to default mode: {}", e);
	}
	result?;

	fs::write(path, &data).map_err(|e| format_err!("couldn't write {:?}: {}", path, e))?;
	println!("Read 0x{:04X} bytes from address 0x{:04X} into {}", count, config.load_address, path);
	Ok(())
}

fn main_app(matches: &clap::ArgMatches) -> AResult<()> {
	let config = config_from(matches)?;
	match get_number(matches, "read", 0x1_0000)? {
		Some(count) => dump(matches, config, count as usize),
		None => program(matches, config),
	}
}

fn main() {
	let matches = clap_app!(@app (app_from_crate!())
		(about: "Program a parallel EEPROM through an FTDI MPSSE bridge")
		(after_help: "Numbers can be given in decimal, hex (prefixed with 0x) or octal (prefixed with 0).")
		(@arg verbose: -v --verbose "Show verbose output (every command frame)")
		(@arg load: -l --load +takes_value "Start address (default 0x0000)")
		(@arg port: -p --port +takes_value "FTDI interface: 0 = A, 1 = B, ... (default 0)")
		(@arg vid: --vid +takes_value "USB vendor id (default 0x0403)")
		(@arg pid: --pid +takes_value "USB product id (default 0x6014)")
		(@arg page: --page +takes_value "EEPROM page size, for progress output (default 64)")
		(@arg delay: --delay +takes_value "Write cycle delay in microseconds (default 15000)")
		(@arg divisor: --divisor +takes_value "MPSSE clock divisor (default 4)")
		(@arg read: -r --read +takes_value "Read this many bytes into FILE instead of programming")
		(@arg dry_run: -n --dry_run "Don't open a device, only log the command stream")
		(@arg FILE: +required "Binary image to program (or target for --read)")
	).get_matches();

	let default_filter = if matches.is_present("verbose") { "debug" } else { "info" };
	env_logger::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

	if let Err(e) = main_app(&matches) {
		error!("Error: {}", e);
		let root = e.find_root_cause();
		if root.to_string() != e.to_string() {
			error!("Caused by: {}", root);
		}
		exit(1);
	}
}
