mod error;
mod schedule;

pub use error::RuntimeError;
pub use schedule::{parse_schedule, ScheduleEntry, ScheduleError};

use log::{debug, info, warn};
use crate::io::Controller as IoController;
use crate::isa::*;
use crate::micro::{self, BusDest, BusSource, Condition, CtrlSignal, IoAccess, MemAccess, ReadDest, Step, WriteSource};
use crate::unit::*;

// How a simulation ended:
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Outcome
{
	Halted,
	TickLimit,
}

// The result of a finished simulation:
#[derive(Debug)]
pub struct Run
{
	pub output: String,
	pub instructions: u64,
	pub ticks: u64,
	pub outcome: Outcome,
}

pub struct Machine
{
	// The units of the machine:
	pub arithmetic_unit: ArithmeticUnit,
	pub control_unit: ControlUnit,
	pub memory_unit: MemoryUnit,

	// The memory-mapped devices behind the data bus:
	pub io_controller: IoController,
}

impl Machine
{
	pub fn new(memory_words: usize, interactive_console: bool) -> Machine
	{
		Machine
		{
			arithmetic_unit: ArithmeticUnit::new(),
			control_unit: ControlUnit::new(),
			memory_unit: MemoryUnit::new(memory_words),
			io_controller: IoController::new(interactive_console),
		}
	}

	pub fn load_image(&mut self, image: &Image) -> Result<(), RuntimeError>
	{
		self.memory_unit.load_image(image)
	}
}

impl Machine
{
	fn source_value(&self, source: BusSource) -> Result<i32, RuntimeError>
	{
		match source
		{
			BusSource::Ac 			=> Ok(self.arithmetic_unit.acc),
			BusSource::Br 			=> Ok(self.arithmetic_unit.buf),
			BusSource::Pc 			=> Ok(self.control_unit.pc as i32),
			BusSource::AluOut 		=> Ok(self.arithmetic_unit.output),
			BusSource::IrArg 		=> self.control_unit.ir_arg(),
			BusSource::DataBus 		=> Ok(self.io_controller.bus.value),
			BusSource::IrqVector 	=> Ok(self.io_controller.irq_vector()),
			BusSource::Const(value) => Ok(value),
		}
	}

	fn condition_holds(&self, cond: Condition) -> bool
	{
		match cond
		{
			Condition::Zero 		=> self.arithmetic_unit.zero(),
			Condition::NotZero 		=> !self.arithmetic_unit.zero(),
			Condition::Negative 	=> self.arithmetic_unit.negative(),
			Condition::NotNegative 	=> !self.arithmetic_unit.negative(),
		}
	}

	// Process one step descriptor. Every step consumes exactly one tick;
	// a failed condition reduces the step to that tick.
	fn perform_step(&mut self, step: &Step) -> Result<(), RuntimeError>
	{
		let perform = step.cond.map_or(true, |cond| self.condition_holds(cond));

		if perform
		{
			// Signal the ALU:
			if let Some(selector) = step.alu
			{
				self.arithmetic_unit.signal_alu(selector)?;
			}

			// Perform the register transfer:
			if let Some(xfer) = step.xfer
			{
				let value = self.source_value(xfer.source)?;

				match xfer.dest
				{
					BusDest::Ac => self.arithmetic_unit.acc = value,
					BusDest::Br => self.arithmetic_unit.buf = value,
					BusDest::Ar => self.memory_unit.ar = value,
					BusDest::Pc => self.control_unit.set_pc(value, self.memory_unit.size())?,
				}
			}

			// Signal the memory:
			if let Some(access) = step.mem
			{
				match access
				{
					MemAccess::Read(ReadDest::Ir) =>
					{
						let pc = self.control_unit.pc;

						if pc >= self.memory_unit.size()
						{
							return Err(RuntimeError::PcOutOfRange { addr: pc as i32 });
						}

						let word = self.memory_unit.read_word(pc)?.clone();
						self.control_unit.latch_ir(word);
					},
					MemAccess::Read(ReadDest::Br) =>
					{
						self.arithmetic_unit.buf = self.memory_unit.read_memory()?;
					},
					MemAccess::Read(ReadDest::Ac) =>
					{
						self.arithmetic_unit.acc = self.memory_unit.read_memory()?;
					},
					MemAccess::Read(ReadDest::Pc) =>
					{
						let value = self.memory_unit.read_memory()?;
						self.control_unit.set_pc(value, self.memory_unit.size())?;
					},
					MemAccess::Write(WriteSource::Ac) =>
					{
						self.memory_unit.write_memory(self.arithmetic_unit.acc)?;
					},
					MemAccess::Write(WriteSource::Pc) =>
					{
						self.memory_unit.write_memory(self.control_unit.pc as i32)?;
					},
				}
			}

			// Signal the I/O controller (the port number sits in BR):
			if let Some(access) = step.io
			{
				match access
				{
					IoAccess::Read => self.io_controller.signal_read(self.arithmetic_unit.buf)?,
					IoAccess::Write =>
					{
						self.io_controller.bus.value = self.arithmetic_unit.acc;
						self.io_controller.signal_write(self.arithmetic_unit.buf)?;
					},
				}
			}

			// Signals for the control unit itself:
			if let Some(signal) = step.ctrl
			{
				match signal
				{
					CtrlSignal::IncrementPc 		=> self.control_unit.increment_pc(),
					CtrlSignal::Decode 				=>
					{
						self.control_unit.decode()?;
					},
					CtrlSignal::Halt 				=> self.control_unit.halt(),
					CtrlSignal::EnableInterrupts 	=> self.control_unit.set_interrupt_enable(true),
					CtrlSignal::DisableInterrupts 	=> self.control_unit.set_interrupt_enable(false),
					CtrlSignal::EnterInterrupt 		=> self.control_unit.set_in_interrupt(true),
					CtrlSignal::LeaveInterrupt 		=> self.control_unit.set_in_interrupt(false),
				}
			}
		}

		self.control_unit.advance_tick();
		Ok(())
	}

	fn perform_steps(&mut self, steps: &[Step]) -> Result<(), RuntimeError>
	{
		for step in steps
		{
			self.perform_step(step)?;
		}

		Ok(())
	}

	// One full command cycle: fetch, decode, operand fetch, execute, interrupt poll.
	// A pending request enters its handler at the cycle boundary, never mid-cycle.
	pub fn perform_command_cycle(&mut self) -> Result<(), RuntimeError>
	{
		self.perform_steps(&micro::fetch_steps())?;
		self.perform_step(&micro::decode_step())?;

		let decoder = self.control_unit.decoder().expect("The decoder is latched after the decode step.");

		self.perform_steps(&micro::operand_steps(decoder.mode))?;
		self.perform_steps(&micro::execute_steps(decoder.opcode))?;

		self.perform_step(&micro::poll_step())?;

		debug!
		(
			"TICK {:6} | PC {:4} | AC {:11} | Z {:} N {:} | IE {:} IRQ {:} IS {:} | {:}",
			self.control_unit.tick(),
			self.control_unit.pc,
			self.arithmetic_unit.acc,
			self.arithmetic_unit.zero() as u8,
			self.arithmetic_unit.negative() as u8,
			self.control_unit.interrupt_enabled() as u8,
			self.control_unit.status().int_flags.contains(IntFlags::IRQ) as u8,
			self.control_unit.in_interrupt() as u8,
			decoder.opcode,
		);

		if self.control_unit.is_running() && self.control_unit.interrupt_pending()
		{
			debug!("Entering the interrupt handler.");

			self.control_unit.set_interrupt_request(false);
			self.io_controller.line.acknowledge();
			self.perform_steps(&micro::prologue_steps(true))?;
		}

		self.control_unit.count_instruction();
		self.control_unit.end_command_cycle();

		Ok(())
	}

	// The driver loop: inject due schedule entries, run command cycles,
	// drain the output device, observe HLT and the tick limit.
	pub fn run(&mut self, schedule: &[ScheduleEntry], tick_limit: u64) -> Result<Run, RuntimeError>
	{
		let mut output = String::new();
		let mut next_input = 0;

		while self.control_unit.is_running()
		{
			if self.control_unit.tick() >= tick_limit
			{
				warn!("Tick limit of {:} reached, stopping the simulation.", tick_limit);

				return Ok(Run
				{
					output,
					instructions: self.control_unit.instructions(),
					ticks: self.control_unit.tick(),
					outcome: Outcome::TickLimit,
				});
			}

			// Inject every due schedule entry before the next command cycle.
			// The IRQ flag is only latched while interrupts are enabled.
			while (next_input < schedule.len()) && (schedule[next_input].at <= self.control_unit.tick())
			{
				let entry = schedule[next_input];
				debug!("Input {:?} (scheduled for tick {:}) injected at tick {:}.", entry.symbol, entry.at, self.control_unit.tick());

				self.io_controller.console_receive(entry.symbol as i32);

				if self.control_unit.interrupt_enabled()
				{
					self.control_unit.set_interrupt_request(true);
				}

				next_input += 1;
			}

			self.perform_command_cycle()?;

			// Drain the output device:
			while let Some(value) = self.io_controller.take_output()
			{
				let symbol = char::from_u32(value as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
				debug!("Output {:?} + {:?}", output, symbol);
				output.push(symbol);
			}
		}

		info!
		(
			"Simulation halted after {:} instructions and {:} ticks.",
			self.control_unit.instructions(),
			self.control_unit.tick(),
		);

		Ok(Run
		{
			output,
			instructions: self.control_unit.instructions(),
			ticks: self.control_unit.tick(),
			outcome: Outcome::Halted,
		})
	}
}

// Prepare a machine with default memory, load the image and run it:
pub fn simulation(image: &Image, schedule: &[ScheduleEntry], tick_limit: u64, interactive_console: bool) -> Result<Run, RuntimeError>
{
	let mut machine = Machine::new(DEFAULT_MEMORY_WORDS, interactive_console);
	machine.load_image(image)?;
	machine.run(schedule, tick_limit)
}
