use crate::isa::StatusFlags;
use crate::machine::RuntimeError;

// Which ALU input latches does a cycle load?
// The left latch is fed from BR, the right latch from AC.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LatchGate
{
	Left,
	Right,
	Both,
	None,
}

// Which latched values do the unary stages (neg, inc, dec) apply to?
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SideGate
{
	Left,
	Right,
	Both,
	None,
}

// The operations of the ALU.
// Binary operations compute "left op right"; the shifts move the right latch by one bit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AluOp
{
	Add,
	Sub,
	Mul,
	Div,
	Mod,
	And,
	Or,
	Lsl,
	Asr,
}

// The full selector issued by the control unit for one ALU cycle.
// neg, inc and dec are applied in that order to the latched values.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Selector
{
	pub load: LatchGate,
	pub neg: SideGate,
	pub inc: SideGate,
	pub dec: SideGate,
	pub op: AluOp,
}

impl Selector
{
	// Builder pattern:
	pub fn new(load: LatchGate, op: AluOp) -> Selector
	{
		Selector
		{
			load,
			neg: SideGate::None,
			inc: SideGate::None,
			dec: SideGate::None,
			op,
		}
	}

	pub fn with_neg(mut self, side: SideGate) -> Selector
	{
		self.neg = side;
		self
	}

	pub fn with_inc(mut self, side: SideGate) -> Selector
	{
		self.inc = side;
		self
	}

	pub fn with_dec(mut self, side: SideGate) -> Selector
	{
		self.dec = side;
		self
	}
}

pub struct Unit
{
	// "Accumulator" (AC)
	// The single general purpose register of the machine
	pub acc: i32,

	// "Buffer register" (BR)
	// Holds fetched operands, branch targets and I/O port numbers
	pub buf: i32,

	// The ALU input latches (reset to zero after every cycle):
	pub left: i32,
	pub right: i32,

	// The ALU output register:
	pub output: i32,

	// The datapath flags, latched from the output after every cycle:
	flags: StatusFlags,
}

impl Unit
{
	pub fn new() -> Unit
	{
		Unit
		{
			acc: 0,
			buf: 0,
			left: 0,
			right: 0,
			output: 0,
			flags: StatusFlags::empty(),
		}
	}

	pub fn flags(&self) -> StatusFlags
	{
		self.flags
	}

	pub fn zero(&self) -> bool
	{
		self.flags.contains(StatusFlags::Z)
	}

	pub fn negative(&self) -> bool
	{
		self.flags.contains(StatusFlags::N)
	}
}

impl Unit
{
	// Perform one ALU cycle as described by the selector.
	// All arithmetic wraps in two's complement; division truncates toward zero
	// and the remainder takes the sign of the left operand.
	pub(crate) fn signal_alu(&mut self, selector: Selector) -> Result<(), RuntimeError>
	{
		// Gate the latches:
		match selector.load
		{
			LatchGate::Left 	=> self.left = self.buf,
			LatchGate::Right 	=> self.right = self.acc,
			LatchGate::Both 	=>
			{
				self.left = self.buf;
				self.right = self.acc;
			},
			LatchGate::None 	=> (),
		}

		// Apply the unary stages in their fixed order:
		Unit::apply(&mut self.left, &mut self.right, selector.neg, |value| value.wrapping_neg());
		Unit::apply(&mut self.left, &mut self.right, selector.inc, |value| value.wrapping_add(1));
		Unit::apply(&mut self.left, &mut self.right, selector.dec, |value| value.wrapping_sub(1));

		let result = match selector.op
		{
			AluOp::Add 	=> self.left.wrapping_add(self.right),
			AluOp::Sub 	=> self.left.wrapping_sub(self.right),
			AluOp::Mul 	=> self.left.wrapping_mul(self.right),
			AluOp::Div 	=>
			{
				if self.right == 0
				{
					return Err(RuntimeError::DivisionByZero);
				}

				self.left.wrapping_div(self.right)
			},
			AluOp::Mod 	=>
			{
				if self.right == 0
				{
					return Err(RuntimeError::DivisionByZero);
				}

				self.left.wrapping_rem(self.right)
			},
			AluOp::And 	=> self.left & self.right,
			AluOp::Or 	=> self.left | self.right,
			AluOp::Lsl 	=> self.right.wrapping_shl(1),
			AluOp::Asr 	=> self.right >> 1,
		};

		self.output = result;

		// Latch the flags:
		self.flags.set(StatusFlags::Z, result == 0);
		self.flags.set(StatusFlags::N, result < 0);

		// The latches are reset after each cycle:
		self.left = 0;
		self.right = 0;

		Ok(())
	}

	fn apply(left: &mut i32, right: &mut i32, side: SideGate, stage: impl Fn(i32) -> i32)
	{
		match side
		{
			SideGate::Left 	=> *left = stage(*left),
			SideGate::Right => *right = stage(*right),
			SideGate::Both 	=>
			{
				*left = stage(*left);
				*right = stage(*right);
			},
			SideGate::None 	=> (),
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn unit_with(acc: i32, buf: i32) -> Unit
	{
		let mut unit = Unit::new();
		unit.acc = acc;
		unit.buf = buf;
		unit
	}

	// The composition realizing "LD": the left value flows through.
	fn pass_left() -> Selector
	{
		Selector::new(LatchGate::Left, AluOp::Or)
	}

	#[test]
	fn pass_through_copies_the_buffer()
	{
		let mut unit = unit_with(99, -7);
		unit.signal_alu(pass_left()).unwrap();

		assert_eq!(unit.output, -7);
		assert!(unit.negative());
		assert!(!unit.zero());
	}

	#[test]
	fn binary_operations_compute_left_op_right()
	{
		let cases: [(AluOp, i32); 7] =
		[
			(AluOp::Add, 17),
			(AluOp::Sub, 23),
			(AluOp::Mul, -60),
			(AluOp::Div, -6),
			(AluOp::Mod, 2),
			(AluOp::And, 20 & -3),
			(AluOp::Or, 20 | -3),
		];

		for (op, expected) in cases
		{
			let mut unit = unit_with(-3, 20);
			unit.signal_alu(Selector::new(LatchGate::Both, op)).unwrap();
			assert_eq!(unit.output, expected, "{:?}", op);
		}
	}

	#[test]
	fn division_truncates_toward_zero()
	{
		let mut unit = unit_with(2, -7);
		unit.signal_alu(Selector::new(LatchGate::Both, AluOp::Div)).unwrap();
		assert_eq!(unit.output, -3);

		// The remainder takes the sign of the dividend:
		let mut unit = unit_with(2, -7);
		unit.signal_alu(Selector::new(LatchGate::Both, AluOp::Mod)).unwrap();
		assert_eq!(unit.output, -1);
	}

	#[test]
	fn division_by_zero_is_a_runtime_error()
	{
		let mut unit = unit_with(0, 1);
		assert!(unit.signal_alu(Selector::new(LatchGate::Both, AluOp::Div)).is_err());
	}

	#[test]
	fn unary_stages_apply_in_order()
	{
		// Negate and then increment the right latch: -(5) + 1 == -4.
		let mut unit = unit_with(5, 0);
		let selector = Selector::new(LatchGate::Right, AluOp::Or)
			.with_neg(SideGate::Right)
			.with_inc(SideGate::Right);

		unit.signal_alu(selector).unwrap();
		assert_eq!(unit.output, -4);
	}

	#[test]
	fn increment_and_decrement_reach_the_accumulator()
	{
		let mut unit = unit_with(41, 0);
		unit.signal_alu(Selector::new(LatchGate::Right, AluOp::Or).with_inc(SideGate::Right)).unwrap();
		assert_eq!(unit.output, 42);

		let mut unit = unit_with(43, 0);
		unit.signal_alu(Selector::new(LatchGate::Right, AluOp::Or).with_dec(SideGate::Right)).unwrap();
		assert_eq!(unit.output, 42);
	}

	#[test]
	fn shifts_move_the_right_latch()
	{
		let mut unit = unit_with(3, 0);
		unit.signal_alu(Selector::new(LatchGate::Right, AluOp::Lsl)).unwrap();
		assert_eq!(unit.output, 6);

		let mut unit = unit_with(-8, 0);
		unit.signal_alu(Selector::new(LatchGate::Right, AluOp::Asr)).unwrap();
		assert_eq!(unit.output, -4);
	}

	#[test]
	fn latches_reset_between_cycles()
	{
		let mut unit = unit_with(10, 20);
		unit.signal_alu(Selector::new(LatchGate::Both, AluOp::Add)).unwrap();
		assert_eq!(unit.output, 30);

		// Nothing gated: both latches read as zero again.
		unit.signal_alu(Selector::new(LatchGate::None, AluOp::Add)).unwrap();
		assert_eq!(unit.output, 0);
		assert!(unit.zero());
	}

	#[test]
	fn flags_mirror_the_output()
	{
		let mut unit = unit_with(5, 5);
		unit.signal_alu(Selector::new(LatchGate::Both, AluOp::Sub)).unwrap();
		assert!(unit.zero());
		assert!(!unit.negative());

		let mut unit = unit_with(7, 5);
		unit.signal_alu(Selector::new(LatchGate::Both, AluOp::Sub)).unwrap();
		assert!(!unit.zero());
		assert!(unit.negative());
	}
}
