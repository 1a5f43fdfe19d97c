use std::error::Error;
use std::fmt;

// Everything that can go wrong while the model is ticking.
// All of these end the simulation; the tick limit is handled by the driver
// and is a warning, not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum RuntimeError
{
	AddressOutOfRange { addr: i32 },
	PcOutOfRange { addr: i32 },
	DataAccessToInstruction { addr: usize },
	WriteToInstruction { addr: usize },
	DecodeOfDataWord { addr: usize },
	MissingArgument { addr: usize },
	PortOutOfRange { port: i32 },
	DivisionByZero,
	ImageTooLarge { words: usize, memory: usize },
	MalformedImage { position: usize, index: usize },
}

impl fmt::Display for RuntimeError
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		match self
		{
			RuntimeError::AddressOutOfRange { addr } 			=> write!(f, "The address {:} is outside of memory.", addr),
			RuntimeError::PcOutOfRange { addr } 				=> write!(f, "The program counter left memory (target {:}).", addr),
			RuntimeError::DataAccessToInstruction { addr } 		=> write!(f, "Data read from the instruction slot at address {:}.", addr),
			RuntimeError::WriteToInstruction { addr } 			=> write!(f, "Data write to the instruction slot at address {:}.", addr),
			RuntimeError::DecodeOfDataWord { addr } 			=> write!(f, "The word at address {:} is not an instruction and cannot be decoded.", addr),
			RuntimeError::MissingArgument { addr } 				=> write!(f, "The instruction at address {:} carries no argument.", addr),
			RuntimeError::PortOutOfRange { port } 				=> write!(f, "The I/O port {:} does not address any device.", port),
			RuntimeError::DivisionByZero 						=> write!(f, "Division by zero in the ALU."),
			RuntimeError::ImageTooLarge { words, memory } 		=> write!(f, "The image holds {:} words but memory only {:}.", words, memory),
			RuntimeError::MalformedImage { position, index } 	=> write!(f, "The image word at position {:} carries index {:}.", position, index),
		}
	}
}

impl Error for RuntimeError { }
