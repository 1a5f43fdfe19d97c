use crate::isa::AddrMode;
use super::descriptor::*;

// The operand fetch per addressing mode.
// Every memory access is its own tick; a no-operand instruction idles one tick.
pub fn steps(mode: Option<AddrMode>) -> Vec<Step>
{
	match mode
	{
		None => vec![Step::empty()],

		Some(AddrMode::Value) => vec!
		[
			Step::empty().with_xfer(BusSource::IrArg, BusDest::Br),
		],

		Some(AddrMode::Direct) => vec!
		[
			Step::empty().with_xfer(BusSource::IrArg, BusDest::Ar),
			Step::empty().with_mem(MemAccess::Read(ReadDest::Br)),
		],

		Some(AddrMode::Indirect) => vec!
		[
			Step::empty().with_xfer(BusSource::IrArg, BusDest::Ar),
			Step::empty().with_mem(MemAccess::Read(ReadDest::Br)),
			Step::empty().with_xfer(BusSource::Br, BusDest::Ar),
			Step::empty().with_mem(MemAccess::Read(ReadDest::Br)),
		],
	}
}
