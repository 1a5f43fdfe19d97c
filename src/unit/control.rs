use crate::isa::*;
use crate::machine::RuntimeError;

// The decoder fields, latched during the decode phase:
#[derive(Copy, Clone)]
pub struct Decoder
{
	pub opcode: Opcode,
	pub mode: Option<AddrMode>,
}

// The control unit encapsulates a status field:
pub struct Status
{
	// The RUN flag indicates if the machine is running (true) or halted (false).
	pub run: Flag,

	// IE (interrupt enable), IRQ (request pending) and IS (in interrupt):
	pub int_flags: IntFlags,
}

impl Status
{
	pub fn new() -> Status
	{
		Status
		{
			run: Flag(true),
			int_flags: IntFlags::empty(),
		}
	}
}

pub struct Unit
{
	// Program counter
	// Execution starts right behind the interrupt vector.
	pub pc: usize,

	// Instruction register
	// Holds the word fetched for the current command cycle.
	ir: Option<MachineWord>,

	// The decoder (only latched between decode and the end of the cycle):
	decoder: Option<Decoder>,

	// The status field:
	status: Status,

	// Tick and command counters since simulation start:
	tick: u64,
	instructions: u64,
}

impl Unit
{
	pub fn new() -> Unit
	{
		Unit
		{
			pc: MACHINE_START_ADDR,
			ir: None,
			decoder: None,
			status: Status::new(),
			tick: 0,
			instructions: 0,
		}
	}

	pub fn status(&self) -> &Status
	{
		&self.status
	}

	pub fn tick(&self) -> u64
	{
		self.tick
	}

	pub fn instructions(&self) -> u64
	{
		self.instructions
	}

	pub fn decoder(&self) -> Option<Decoder>
	{
		self.decoder
	}

	pub fn is_running(&self) -> bool
	{
		self.status.run.0
	}

	pub fn interrupt_enabled(&self) -> bool
	{
		self.status.int_flags.contains(IntFlags::IE)
	}

	pub fn in_interrupt(&self) -> bool
	{
		self.status.int_flags.contains(IntFlags::IS)
	}

	// Accept a pending request only outside of a running handler:
	pub fn interrupt_pending(&self) -> bool
	{
		self.status.int_flags.contains(IntFlags::IRQ) && !self.in_interrupt()
	}
}

impl Unit
{
	pub(crate) fn advance_tick(&mut self)
	{
		self.tick += 1;
	}

	pub(crate) fn count_instruction(&mut self)
	{
		self.instructions += 1;
	}

	pub(crate) fn latch_ir(&mut self, word: MachineWord)
	{
		self.ir = Some(word);
	}

	// Latch opcode and mode into the decoder.
	// A data word in the instruction register cannot be decoded.
	pub(crate) fn decode(&mut self) -> Result<Decoder, RuntimeError>
	{
		match &self.ir
		{
			Some(MachineWord::Instruction(word)) =>
			{
				let decoder = Decoder { opcode: word.opcode, mode: word.mode };
				self.decoder = Some(decoder);
				Ok(decoder)
			},
			Some(MachineWord::Data(word)) 	=> Err(RuntimeError::DecodeOfDataWord { addr: word.index }),
			None 							=> Err(RuntimeError::MissingArgument { addr: self.pc }),
		}
	}

	// The argument field of the fetched instruction:
	pub(crate) fn ir_arg(&self) -> Result<i32, RuntimeError>
	{
		match &self.ir
		{
			Some(MachineWord::Instruction(word)) 	=> word.arg.ok_or(RuntimeError::MissingArgument { addr: word.index }),
			_ 										=> Err(RuntimeError::MissingArgument { addr: self.pc }),
		}
	}

	pub(crate) fn increment_pc(&mut self)
	{
		self.pc += 1;
	}

	// PC must stay inside memory at all times:
	pub(crate) fn set_pc(&mut self, value: i32, memory_words: usize) -> Result<(), RuntimeError>
	{
		if (value < 0) || (value as usize >= memory_words)
		{
			return Err(RuntimeError::PcOutOfRange { addr: value });
		}

		self.pc = value as usize;
		Ok(())
	}

	pub(crate) fn halt(&mut self)
	{
		self.status.run = Flag(false);
	}

	pub(crate) fn set_interrupt_enable(&mut self, enabled: bool)
	{
		self.status.int_flags.set(IntFlags::IE, enabled);
	}

	pub(crate) fn set_interrupt_request(&mut self, requested: bool)
	{
		self.status.int_flags.set(IntFlags::IRQ, requested);
	}

	pub(crate) fn set_in_interrupt(&mut self, inside: bool)
	{
		self.status.int_flags.set(IntFlags::IS, inside);
	}

	// Drop instruction register and decoder at the command cycle boundary:
	pub(crate) fn end_command_cycle(&mut self)
	{
		self.ir = None;
		self.decoder = None;
	}
}
