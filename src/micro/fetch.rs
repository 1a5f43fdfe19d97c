use super::descriptor::*;

// The fetch phase: IR <- memory[PC]; PC <- PC + 1.
pub fn steps() -> Vec<Step>
{
	vec!
	[
		Step::empty().with_mem(MemAccess::Read(ReadDest::Ir)),
		Step::empty().with_ctrl(CtrlSignal::IncrementPc),
	]
}

// The decode phase latches opcode and mode into the decoder:
pub fn decode_step() -> Step
{
	Step::empty().with_ctrl(CtrlSignal::Decode)
}
