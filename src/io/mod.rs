use std::collections::VecDeque;
use std::io::{self, BufRead};
use log::debug;
use crate::machine::RuntimeError;

// Seven memory-mapped devices; the console occupies the last slot.
// Device k (numbered from 1) owns port 2(k - 1) ("int" status register,
// read only) and port 2(k - 1) + 1 ("data" register).
pub const DEVICE_COUNT: usize = 7;
pub const CONSOLE_DEVICE: usize = 7;
pub const OUTPUT_DEVICE: usize = 2;

// The data bus carries a single 32-bit value between CPU and devices:
pub struct DataBus
{
	pub value: i32,
}

// The shared interrupt request line between the devices and the CPU:
pub struct InterruptionLine
{
	raised: bool,
}

impl InterruptionLine
{
	fn new() -> InterruptionLine
	{
		InterruptionLine { raised: false }
	}

	pub fn is_raised(&self) -> bool
	{
		self.raised
	}

	pub(crate) fn raise(&mut self)
	{
		self.raised = true;
	}

	pub(crate) fn acknowledge(&mut self)
	{
		self.raised = false;
	}
}

// The register pair every plain device consists of:
pub struct CommonDevice
{
	int_reg: i32,
	data_reg: i32,
	new_data: bool,
}

impl CommonDevice
{
	fn new() -> CommonDevice
	{
		CommonDevice
		{
			int_reg: 0,
			data_reg: 0,
			new_data: false,
		}
	}

	fn read_int(&self) -> i32
	{
		self.int_reg
	}

	// Reading the data register clears the pending status:
	fn read_data(&mut self) -> i32
	{
		self.int_reg = 0;
		self.data_reg
	}

	fn write_data(&mut self, value: i32)
	{
		self.data_reg = value;
		self.new_data = true;
	}

	fn take_new_data(&mut self) -> Option<i32>
	{
		if self.new_data
		{
			self.new_data = false;
			Some(self.data_reg)
		}
		else
		{
			None
		}
	}

	fn signal_int_request(&mut self, line: &mut InterruptionLine)
	{
		self.int_reg = 1;
		line.raise();
	}
}

// The console device: a byte queue on top of the common registers.
// The queue is filled by the input schedule or, in interactive mode,
// on demand from one line of stdin. A drained line emits a single LF
// before the queue reads as empty again; empty reads yield 0.
pub struct ConsoleDevice
{
	base: CommonDevice,
	pending: VecDeque<i32>,
	interactive: bool,
}

impl ConsoleDevice
{
	fn new(interactive: bool) -> ConsoleDevice
	{
		ConsoleDevice
		{
			base: CommonDevice::new(),
			pending: VecDeque::new(),
			interactive,
		}
	}

	// One scheduled byte arrives:
	fn receive(&mut self, byte: i32, line: &mut InterruptionLine)
	{
		self.pending.push_back(byte);
		self.base.signal_int_request(line);
	}

	// A whole stdin line arrives, terminated by a LF:
	fn fill_from_line(&mut self, text: &str)
	{
		for symbol in text.chars().filter(|&c| c != '\n')
		{
			self.pending.push_back(symbol as i32);
		}

		self.pending.push_back(10);
	}

	fn read_data(&mut self) -> i32
	{
		if self.pending.is_empty() && self.interactive
		{
			let mut text = String::new();

			if let Ok(count) = io::stdin().lock().read_line(&mut text)
			{
				if count > 0
				{
					self.fill_from_line(&text);
				}
			}
		}

		match self.pending.pop_front()
		{
			Some(value) =>
			{
				if self.pending.is_empty()
				{
					self.base.int_reg = 0;
				}

				value
			},
			None => 0,
		}
	}
}

// A device slot is either a plain register pair or the console:
pub enum IoDevice
{
	Common(CommonDevice),
	Console(ConsoleDevice),
}

impl IoDevice
{
	fn read_int(&self) -> i32
	{
		match self
		{
			IoDevice::Common(device) 	=> device.read_int(),
			IoDevice::Console(device) 	=> device.base.read_int(),
		}
	}

	fn read_data(&mut self) -> i32
	{
		match self
		{
			IoDevice::Common(device) 	=> device.read_data(),
			IoDevice::Console(device) 	=> device.read_data(),
		}
	}

	fn write_data(&mut self, value: i32)
	{
		match self
		{
			IoDevice::Common(device) 	=> device.write_data(value),

			// The console produces input; writes to it are dropped:
			IoDevice::Console(_) 		=> debug!("Dropped a write of {:} to the console device.", value),
		}
	}
}

// The controller connects the devices to the data bus and the interruption line:
pub struct Controller
{
	pub bus: DataBus,
	pub line: InterruptionLine,
	devices: Vec<IoDevice>,
}

impl Controller
{
	pub fn new(interactive_console: bool) -> Controller
	{
		let mut devices: Vec<IoDevice> = (1..DEVICE_COUNT).map(|_| IoDevice::Common(CommonDevice::new())).collect();
		devices.push(IoDevice::Console(ConsoleDevice::new(interactive_console)));

		Controller
		{
			bus: DataBus { value: 0 },
			line: InterruptionLine::new(),
			devices,
		}
	}

	// The vector index latched into BR on asynchronous interrupt entry.
	// The current hardware always dispatches through vector 0.
	pub fn irq_vector(&self) -> i32
	{
		0
	}

	// Map a port to a device slot; odd ports address the data register.
	fn slot_for_port(&self, port: i32) -> Result<(usize, bool), RuntimeError>
	{
		if port < 0
		{
			return Err(RuntimeError::PortOutOfRange { port });
		}

		let slot = (port / 2) as usize;

		if slot >= self.devices.len()
		{
			return Err(RuntimeError::PortOutOfRange { port });
		}

		Ok((slot, (port % 2) == 1))
	}

	// A CPU read request: the addressed register value lands on the data bus.
	pub(crate) fn signal_read(&mut self, port: i32) -> Result<(), RuntimeError>
	{
		let (slot, data) = self.slot_for_port(port)?;

		self.bus.value = if data
		{
			self.devices[slot].read_data()
		}
		else
		{
			self.devices[slot].read_int()
		};

		debug!("IO read on port {:}: {:} -> bus", port, self.bus.value);
		Ok(())
	}

	// A CPU write request: the data bus value lands in the data register.
	// Writes to the read-only status register are ignored.
	pub(crate) fn signal_write(&mut self, port: i32) -> Result<(), RuntimeError>
	{
		let (slot, data) = self.slot_for_port(port)?;

		if data
		{
			self.devices[slot].write_data(self.bus.value);
		}

		debug!("IO write on port {:}: bus = {:}", port, self.bus.value);
		Ok(())
	}

	// Inject one scheduled byte into the console:
	pub(crate) fn console_receive(&mut self, byte: i32)
	{
		let slot = CONSOLE_DEVICE - 1;

		// Split the borrow between device and line:
		let (devices, line) = (&mut self.devices, &mut self.line);

		if let IoDevice::Console(console) = &mut devices[slot]
		{
			console.receive(byte, line);
		}
	}

	// Drain the output device after a command cycle:
	pub(crate) fn take_output(&mut self) -> Option<i32>
	{
		match &mut self.devices[OUTPUT_DEVICE - 1]
		{
			IoDevice::Common(device) 	=> device.take_new_data(),
			IoDevice::Console(_) 		=> None,
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn ports_map_to_status_and_data_registers()
	{
		let mut controller = Controller::new(false);

		// Nothing pending: both registers of device 1 read as zero.
		controller.signal_read(0).unwrap();
		assert_eq!(controller.bus.value, 0);
		controller.signal_read(1).unwrap();
		assert_eq!(controller.bus.value, 0);

		// A write to the data register of device 2 is visible to the driver:
		controller.bus.value = 65;
		controller.signal_write(3).unwrap();
		assert_eq!(controller.take_output(), Some(65));
		assert_eq!(controller.take_output(), None);
	}

	#[test]
	fn status_registers_ignore_writes()
	{
		let mut controller = Controller::new(false);

		controller.bus.value = 99;
		controller.signal_write(2).unwrap();

		controller.signal_read(2).unwrap();
		assert_eq!(controller.bus.value, 0);
	}

	#[test]
	fn ports_beyond_the_last_device_fail()
	{
		let mut controller = Controller::new(false);

		assert!(matches!(controller.signal_read(14), Err(RuntimeError::PortOutOfRange { port: 14 })));
		assert!(matches!(controller.signal_write(-1), Err(RuntimeError::PortOutOfRange { port: -1 })));
	}

	#[test]
	fn console_queues_scheduled_bytes()
	{
		let mut controller = Controller::new(false);

		controller.console_receive('a' as i32);
		assert!(controller.line.is_raised());

		// The status register of the console is set until the queue drains:
		controller.signal_read((CONSOLE_DEVICE as i32 - 1) * 2).unwrap();
		assert_eq!(controller.bus.value, 1);

		controller.signal_read((CONSOLE_DEVICE as i32 - 1) * 2 + 1).unwrap();
		assert_eq!(controller.bus.value, 'a' as i32);

		// Empty reads yield zero:
		controller.signal_read((CONSOLE_DEVICE as i32 - 1) * 2 + 1).unwrap();
		assert_eq!(controller.bus.value, 0);
	}
}
