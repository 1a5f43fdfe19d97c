use crate::unit::AluSelector;

// Sources for a register transfer inside the datapath:
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BusSource
{
	Ac,
	Br,
	Pc,
	AluOut,
	IrArg,
	DataBus,

	// The vector index latched on asynchronous interrupt entry.
	// It is routed through a single controller signal so a real device-index
	// latch can replace it one day.
	IrqVector,

	Const(i32),
}

// Destinations for a register transfer:
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BusDest
{
	Ac,
	Br,
	Ar,
	Pc,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Xfer
{
	pub source: BusSource,
	pub dest: BusDest,
}

// Where a memory read lands.
// An instruction fetch reads the full word at PC; all data accesses go through AR.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ReadDest
{
	Ir,
	Br,
	Ac,
	Pc,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum WriteSource
{
	Ac,
	Pc,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MemAccess
{
	Read(ReadDest),
	Write(WriteSource),
}

// An I/O request on the port held in BR:
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum IoAccess
{
	Read,
	Write,
}

// Signals handled by the control unit itself:
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CtrlSignal
{
	IncrementPc,
	Decode,
	Halt,
	EnableInterrupts,
	DisableInterrupts,
	EnterInterrupt,
	LeaveInterrupt,
}

// A flag condition gating a whole step (conditional jumps).
// A step with a failed condition still consumes its tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Condition
{
	Zero,
	NotZero,
	Negative,
	NotNegative,
}

// A step descriptor encapsulates everything one micro-step may do.
// Every step consumes exactly one tick.
pub struct Step
{
	pub cond: Option<Condition>,
	pub alu: Option<AluSelector>,
	pub xfer: Option<Xfer>,
	pub mem: Option<MemAccess>,
	pub io: Option<IoAccess>,
	pub ctrl: Option<CtrlSignal>,
}

impl Step
{
	// Builder pattern:
	pub(crate) fn empty() -> Step
	{
		Step
		{
			cond: None,
			alu: None,
			xfer: None,
			mem: None,
			io: None,
			ctrl: None,
		}
	}

	pub(crate) fn with_xfer(mut self, source: BusSource, dest: BusDest) -> Step
	{
		self.xfer = Some(Xfer { source, dest });
		self
	}

	pub(crate) fn with_alu(mut self, selector: AluSelector) -> Step
	{
		self.alu = Some(selector);
		self
	}

	pub(crate) fn with_mem(mut self, access: MemAccess) -> Step
	{
		self.mem = Some(access);
		self
	}

	pub(crate) fn with_io(mut self, access: IoAccess) -> Step
	{
		self.io = Some(access);
		self
	}

	pub(crate) fn with_ctrl(mut self, signal: CtrlSignal) -> Step
	{
		self.ctrl = Some(signal);
		self
	}

	pub(crate) fn when(mut self, cond: Condition) -> Step
	{
		self.cond = Some(cond);
		self
	}
}
