use crate::isa::Opcode;
use crate::unit::{AluOp, AluSelector, LatchGate, SideGate};
use super::descriptor::*;
use super::interrupt;

// The pass-through composition realizing "LD":
// only the left latch is gated, OR flows it to the output.
fn pass_left() -> AluSelector
{
	AluSelector::new(LatchGate::Left, AluOp::Or)
}

fn binary(op: AluOp) -> AluSelector
{
	AluSelector::new(LatchGate::Both, op)
}

// An ALU cycle whose output lands in the accumulator:
fn alu_to_acc(selector: AluSelector) -> Vec<Step>
{
	vec![Step::empty().with_alu(selector).with_xfer(BusSource::AluOut, BusDest::Ac)]
}

fn branch(cond: Condition) -> Vec<Step>
{
	// Both arms consume the tick:
	vec![Step::empty().with_xfer(BusSource::Br, BusDest::Pc).when(cond)]
}

// The execute phase per opcode:
pub fn steps(opcode: Opcode) -> Vec<Step>
{
	match opcode
	{
		Opcode::Ld 		=> alu_to_acc(pass_left()),

		Opcode::St 		=> vec!
		[
			Step::empty().with_xfer(BusSource::Br, BusDest::Ar),
			Step::empty().with_mem(MemAccess::Write(WriteSource::Ac)),
		],

		Opcode::Add 	=> alu_to_acc(binary(AluOp::Add)),
		Opcode::Sub 	=> alu_to_acc(binary(AluOp::Sub)),
		Opcode::Mul 	=> alu_to_acc(binary(AluOp::Mul)),
		Opcode::Div 	=> alu_to_acc(binary(AluOp::Div)),
		Opcode::Mod 	=> alu_to_acc(binary(AluOp::Mod)),
		Opcode::And 	=> alu_to_acc(binary(AluOp::And)),
		Opcode::Or 		=> alu_to_acc(binary(AluOp::Or)),

		// CMP latches the flags of (BR - AC) and leaves the accumulator alone:
		Opcode::Cmp 	=> vec![Step::empty().with_alu(binary(AluOp::Sub))],

		Opcode::Inc 	=> alu_to_acc(AluSelector::new(LatchGate::Right, AluOp::Or).with_inc(SideGate::Right)),
		Opcode::Dec 	=> alu_to_acc(AluSelector::new(LatchGate::Right, AluOp::Or).with_dec(SideGate::Right)),
		Opcode::Lsl 	=> alu_to_acc(AluSelector::new(LatchGate::Right, AluOp::Lsl)),
		Opcode::Asr 	=> alu_to_acc(AluSelector::new(LatchGate::Right, AluOp::Asr)),

		Opcode::Jmp 	=> vec![Step::empty().with_xfer(BusSource::Br, BusDest::Pc)],
		Opcode::Jz 		=> branch(Condition::Zero),
		Opcode::Jnz 	=> branch(Condition::NotZero),
		Opcode::Jn 		=> branch(Condition::Negative),
		Opcode::Jp 		=> branch(Condition::NotNegative),

		// IN requests a read on port BR and overwrites AC from the bus:
		Opcode::In 		=> vec!
		[
			Step::empty().with_io(IoAccess::Read),
			Step::empty().with_xfer(BusSource::DataBus, BusDest::Ac),
		],

		// OUT puts AC on the bus and requests a write on port BR:
		Opcode::Out 	=> vec![Step::empty().with_io(IoAccess::Write)],

		Opcode::Eni 	=> vec![Step::empty().with_ctrl(CtrlSignal::EnableInterrupts)],
		Opcode::Dii 	=> vec![Step::empty().with_ctrl(CtrlSignal::DisableInterrupts)],

		// INT runs the prologue with the vector number already in BR:
		Opcode::Int 	=> interrupt::prologue_steps(false),
		Opcode::Fi 		=> interrupt::epilogue_steps(),

		Opcode::Nop 	=> vec![Step::empty()],
		Opcode::Hlt 	=> vec![Step::empty().with_ctrl(CtrlSignal::Halt)],
	}
}
