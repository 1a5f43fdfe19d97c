use crate::isa::{INT_ACC_ADDR, INT_PC_ADDR};
use super::descriptor::*;

// The interrupt prologue: save AC and PC into their slots, dispatch through
// the vector slot addressed by BR, raise IS.
// Asynchronous entry first latches the vector index into BR; a synchronous
// INT arrives here with the vector number already fetched.
pub fn prologue_steps(asynchronous: bool) -> Vec<Step>
{
	let mut steps = vec![];

	if asynchronous
	{
		steps.push(Step::empty().with_xfer(BusSource::IrqVector, BusDest::Br));
	}

	steps.push(Step::empty().with_xfer(BusSource::Const(INT_ACC_ADDR as i32), BusDest::Ar));
	steps.push(Step::empty().with_mem(MemAccess::Write(WriteSource::Ac)));
	steps.push(Step::empty().with_xfer(BusSource::Const(INT_PC_ADDR as i32), BusDest::Ar));
	steps.push(Step::empty().with_mem(MemAccess::Write(WriteSource::Pc)));
	steps.push(Step::empty().with_xfer(BusSource::Br, BusDest::Ar));
	steps.push(Step::empty().with_mem(MemAccess::Read(ReadDest::Pc)).with_ctrl(CtrlSignal::EnterInterrupt));

	steps
}

// The epilogue ("FI"): restore PC and AC from their slots, clear IS.
pub fn epilogue_steps() -> Vec<Step>
{
	vec!
	[
		Step::empty().with_xfer(BusSource::Const(INT_PC_ADDR as i32), BusDest::Ar),
		Step::empty().with_mem(MemAccess::Read(ReadDest::Pc)),
		Step::empty().with_xfer(BusSource::Const(INT_ACC_ADDR as i32), BusDest::Ar),
		Step::empty().with_mem(MemAccess::Read(ReadDest::Ac)).with_ctrl(CtrlSignal::LeaveInterrupt),
	]
}

// The interrupt poll closing every command cycle (one idle tick):
pub fn poll_step() -> Step
{
	Step::empty()
}
