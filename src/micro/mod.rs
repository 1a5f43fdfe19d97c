mod descriptor;
mod fetch;
mod operand;
mod execute;
mod interrupt;

pub use descriptor::{BusDest, BusSource, Condition, CtrlSignal, IoAccess, MemAccess, ReadDest, Step, WriteSource, Xfer};
pub(crate) use fetch::{decode_step, steps as fetch_steps};
pub(crate) use operand::steps as operand_steps;
pub(crate) use execute::steps as execute_steps;
pub(crate) use interrupt::{epilogue_steps, poll_step, prologue_steps};
