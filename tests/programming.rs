use std::io;
use std::time::Duration;

use ftdi_eeprom_prog::eeprom::frames;
use ftdi_eeprom_prog::error::{
	kind_of,
	ErrorKind,
};
use ftdi_eeprom_prog::programmer::{
	Config,
	Progress,
	Programmer,
	State,
};
use ftdi_eeprom_prog::transport::{
	BitMode,
	Event,
	Recorder,
};

// writes issued by the session initializer
const INIT_WRITES: usize = 4;
const INIT_EVENTS: usize = 2 + INIT_WRITES;

#[derive(Default, Debug)]
struct ProgressLog {
	start: Option<u16>,
	pages: Vec<u16>,
	finish: Option<u16>,
}

impl Progress for ProgressLog {
	fn start(&mut self, load_address: u16) {
		self.start = Some(load_address);
	}

	fn page(&mut self, address: u16) {
		self.pages.push(address);
	}

	fn finish(&mut self, end_address: u16) {
		self.finish = Some(end_address);
	}
}

fn config(load_address: u16, page_size: u16) -> Config {
	Config {
		load_address,
		page_size,
		..Config::default()
	}
}

fn expected_byte_events(address: u16, data: u8, delay: Duration) -> Vec<Event> {
	vec![
		Event::Write(frames::address_latch(address).unwrap().as_bytes().to_vec()),
		Event::Write(frames::byte_write(data).as_bytes().to_vec()),
		Event::Delay(delay),
	]
}

#[test]
fn three_byte_image() {
	let mut rec = Recorder::new();
	let mut log = ProgressLog::default();
	let config = config(0x0010, 64);
	let delay = config.write_delay;
	{
		let mut prog = Programmer::new(&mut rec, config);
		let summary = prog.run(&[0x12u8, 0xab, 0xff][..], &mut log).unwrap();
		assert_eq!(summary.start_address, 0x0010);
		assert_eq!(summary.end_address, 0x0012);
		assert_eq!(summary.bytes_written, 3);
		assert_eq!(prog.state(), State::Done);
		assert_eq!(prog.history(), &[
			State::Idle,
			State::Initializing,
			State::Programming,
			State::Finalizing,
			State::Done,
		][..]);
	}

	let mut expected = Vec::new();
	expected.extend(expected_byte_events(0x0010, 0x12, delay));
	expected.extend(expected_byte_events(0x0011, 0xab, delay));
	expected.extend(expected_byte_events(0x0012, 0xff, delay));
	expected.push(Event::Delay(delay));
	expected.push(Event::BitMode { pin_mask: 0, mode: BitMode::Reset });
	assert_eq!(&rec.events()[INIT_EVENTS..], &expected[..]);

	assert_eq!(log.start, Some(0x0010));
	assert!(log.pages.is_empty());
	assert_eq!(log.finish, Some(0x0012));
}

#[test]
fn page_markers_follow_page_ends() {
	// 0x11 ends a 2-byte page and a 3-byte page
	for &(page_size, ref pages) in &[(2u16, vec![0x11u16]), (3, vec![0x11]), (4, vec![])] {
		let mut rec = Recorder::new();
		let mut log = ProgressLog::default();
		Programmer::new(&mut rec, config(0x0010, page_size))
			.run(&[0x12u8, 0xab, 0xff][..], &mut log)
			.unwrap();
		assert_eq!(&log.pages, pages, "page size {}", page_size);
	}
}

#[test]
fn first_byte_never_reports_a_page() {
	let mut rec = Recorder::new();
	let mut log = ProgressLog::default();
	// 0x3f is the last byte of the first 64 byte page
	Programmer::new(&mut rec, config(0x003f, 64))
		.run(&vec![0u8; 66][..], &mut log)
		.unwrap();
	assert_eq!(log.pages, vec![0x007f]);
}

#[test]
fn write_failure_aborts_but_resets_device() {
	// second byte: latch is write INIT_WRITES + 2, WE# pulse frame the one after
	let mut rec = Recorder::new().fail_on_write(INIT_WRITES + 3);
	let mut log = ProgressLog::default();
	{
		let mut prog = Programmer::new(&mut rec, config(0x0010, 64));
		let e = prog.run(&[0x12u8, 0xab, 0xff][..], &mut log).unwrap_err();
		assert_eq!(kind_of(&e), Some(ErrorKind::TransportWriteFailed));
		assert!(e.to_string().contains("0x0011"), "{}", e);
		assert_eq!(prog.state(), State::Failed);
		assert_eq!(prog.history(), &[
			State::Idle,
			State::Initializing,
			State::Programming,
			State::Failed,
			State::Finalizing,
			State::Failed,
		][..]);
	}

	let latch_3 = frames::address_latch(0x0012).unwrap().as_bytes().to_vec();
	assert!(!rec.writes().contains(&&latch_3[..]));
	assert_eq!(rec.writes().len(), INIT_WRITES + 3);
	assert_eq!(rec.events().last(), Some(&Event::BitMode { pin_mask: 0, mode: BitMode::Reset }));
	assert_eq!(log.finish, None);
}

#[test]
fn init_failure_skips_programming() {
	let mut rec = Recorder::new().fail_on_write(0);
	{
		let mut prog = Programmer::new(&mut rec, Config::default());
		let e = prog.run(&[1u8, 2, 3][..], &mut ProgressLog::default()).unwrap_err();
		assert_eq!(kind_of(&e), Some(ErrorKind::TransportWriteFailed));
		assert_eq!(prog.history(), &[
			State::Idle,
			State::Initializing,
			State::Failed,
			State::Finalizing,
			State::Failed,
		][..]);
	}
	assert!(rec.writes().is_empty());
	assert_eq!(rec.events().last(), Some(&Event::BitMode { pin_mask: 0, mode: BitMode::Reset }));
}

#[test]
fn empty_image() {
	let mut rec = Recorder::new();
	let mut log = ProgressLog::default();
	{
		let mut prog = Programmer::new(&mut rec, config(0x0010, 64));
		let summary = prog.run(io::empty(), &mut log).unwrap();
		assert_eq!(summary.bytes_written, 0);
		assert_eq!(summary.end_address, 0x000f);
		assert_eq!(prog.history(), &[
			State::Idle,
			State::Initializing,
			State::Programming,
			State::Finalizing,
			State::Done,
		][..]);
	}
	assert_eq!(rec.writes().len(), INIT_WRITES);
	assert_eq!(log.finish, Some(0x000f));
}

#[test]
fn image_past_end_of_address_space() {
	let mut rec = Recorder::new();
	let mut prog = Programmer::new(&mut rec, config(0xfffe, 64));
	let e = prog.run(&[1u8, 2, 3][..], &mut ProgressLog::default()).unwrap_err();
	assert_eq!(kind_of(&e), Some(ErrorKind::InputUnavailable));
	assert_eq!(prog.state(), State::Failed);
}

struct BrokenReader;

impl io::Read for BrokenReader {
	fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
		Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
	}
}

#[test]
fn unreadable_input() {
	let mut rec = Recorder::new();
	let mut prog = Programmer::new(&mut rec, Config::default());
	let e = prog.run(BrokenReader, &mut ProgressLog::default()).unwrap_err();
	assert_eq!(kind_of(&e), Some(ErrorKind::InputUnavailable));
}

#[test]
fn runs_only_once() {
	let mut rec = Recorder::new();
	let mut prog = Programmer::new(&mut rec, Config::default());
	prog.run(io::empty(), &mut ProgressLog::default()).unwrap();
	assert!(prog.run(io::empty(), &mut ProgressLog::default()).is_err());
	assert_eq!(prog.state(), State::Done);
}
