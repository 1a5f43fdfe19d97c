mod arithmetic;
mod control;
mod memory;

pub use arithmetic::{AluOp, LatchGate, SideGate, Selector as AluSelector, Unit as ArithmeticUnit};
pub use control::{Decoder, Status as ControlStatus, Unit as ControlUnit};
pub use memory::Unit as MemoryUnit;
