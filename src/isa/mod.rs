use bitflags::bitflags;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

// A machine flag (boolean, newtype idiom):
#[derive(Copy, Clone, PartialEq, PartialOrd)]
pub struct Flag(pub bool);

// The interrupt vector occupies a fixed prefix of memory:
// eight vector slots, two save slots and the default handler.
pub const INT_VECTORS: usize = 8;
pub const INT_ACC_ADDR: usize = 8;
pub const INT_PC_ADDR: usize = 9;
pub const DEFAULT_HANDLER_ADDR: usize = 10;
pub const INT_VECTOR_WORDS: usize = INT_VECTORS + 2 + 1;

// Execution starts right behind the interrupt vector:
pub const MACHINE_START_ADDR: usize = INT_VECTOR_WORDS;

// Default size of the machine memory in words:
pub const DEFAULT_MEMORY_WORDS: usize = 2048;

// The datapath flags, latched after every ALU cycle:
bitflags!
{
	pub struct StatusFlags: u8
	{
		const Z = (1 << 0);
		const N = (1 << 1);
	}
}

// The interrupt flags of the control unit:
bitflags!
{
	pub struct IntFlags: u8
	{
		const IE  = (1 << 0);
		const IRQ = (1 << 1);
		const IS  = (1 << 2);
	}
}

// The opcodes are a closed set, split into three disjoint partitions
// (data manipulation, control flow, no-operand).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Opcode
{
	Ld,
	St,
	Add,
	Sub,
	Mul,
	Div,
	Mod,
	Cmp,
	And,
	Or,
	Out,
	In,
	Jmp,
	Jz,
	Jnz,
	Jn,
	Jp,
	Int,
	Hlt,
	Eni,
	Dii,
	Fi,
	Inc,
	Dec,
	Nop,
	Lsl,
	Asr,
}

impl Opcode
{
	// A constant array of all opcodes (for iteration and table building):
	pub const ALL_OPCODES: [Opcode; 27] =
	[
		Opcode::Ld,  Opcode::St,  Opcode::Add, Opcode::Sub, Opcode::Mul,
		Opcode::Div, Opcode::Mod, Opcode::Cmp, Opcode::And, Opcode::Or,
		Opcode::Out, Opcode::In,  Opcode::Jmp, Opcode::Jz,  Opcode::Jnz,
		Opcode::Jn,  Opcode::Jp,  Opcode::Int, Opcode::Hlt, Opcode::Eni,
		Opcode::Dii, Opcode::Fi,  Opcode::Inc, Opcode::Dec, Opcode::Nop,
		Opcode::Lsl, Opcode::Asr,
	];

	// The human-readable name used in the image file format:
	pub fn wire_name(&self) -> &'static str
	{
		match self
		{
			Opcode::Ld 		=> "load",
			Opcode::St 		=> "store",
			Opcode::Add 	=> "add",
			Opcode::Sub 	=> "substract",
			Opcode::Mul 	=> "multiply",
			Opcode::Div 	=> "divide",
			Opcode::Mod 	=> "modulo",
			Opcode::Cmp 	=> "compare",
			Opcode::And 	=> "and",
			Opcode::Or 		=> "or",
			Opcode::Out 	=> "print",
			Opcode::In 		=> "input",
			Opcode::Jmp 	=> "jump",
			Opcode::Jz 		=> "jump zero",
			Opcode::Jnz 	=> "jump not zero",
			Opcode::Jn 		=> "jump neg",
			Opcode::Jp 		=> "jump not neg",
			Opcode::Int 	=> "interruption",
			Opcode::Hlt 	=> "halt",
			Opcode::Eni 	=> "enable interruption",
			Opcode::Dii 	=> "disable interruption",
			Opcode::Fi 		=> "finish interruption",
			Opcode::Inc 	=> "increment",
			Opcode::Dec 	=> "decrement",
			Opcode::Nop 	=> "no operation",
			Opcode::Lsl 	=> "shift left",
			Opcode::Asr 	=> "shift right",
		}
	}

	pub fn from_wire_name(name: &str) -> Option<Opcode>
	{
		Opcode::ALL_OPCODES.iter().find(|opcode| opcode.wire_name() == name).copied()
	}

	// The argument denotes a data address, a value or a data label:
	pub fn is_data_manipulation(&self) -> bool
	{
		matches!
		(
			self,
			Opcode::Ld | Opcode::St | Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div |
			Opcode::Mod | Opcode::Cmp | Opcode::And | Opcode::Or | Opcode::Out | Opcode::In
		)
	}

	// The argument denotes an instruction label or an interrupt vector:
	pub fn is_control_flow(&self) -> bool
	{
		matches!(self, Opcode::Jmp | Opcode::Jz | Opcode::Jnz | Opcode::Jn | Opcode::Jp | Opcode::Int)
	}

	pub fn is_no_operand(&self) -> bool
	{
		matches!
		(
			self,
			Opcode::Hlt | Opcode::Eni | Opcode::Dii | Opcode::Fi | Opcode::Inc |
			Opcode::Dec | Opcode::Nop | Opcode::Lsl | Opcode::Asr
		)
	}
}

impl fmt::Display for Opcode
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		write!(f, "{:}", self.wire_name())
	}
}

impl Serialize for Opcode
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer
	{
		serializer.serialize_str(self.wire_name())
	}
}

impl<'de> Deserialize<'de> for Opcode
{
	fn deserialize<D>(deserializer: D) -> Result<Opcode, D::Error> where D: Deserializer<'de>
	{
		let name = String::deserialize(deserializer)?;
		Opcode::from_wire_name(&name).ok_or_else(|| de::Error::custom(format!("unknown opcode \"{:}\"", name)))
	}
}

// The addressing mode of a unary instruction.
// It is inferred from the count of '*' sigils on the argument.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddrMode
{
	Value,
	Direct,
	Indirect,
}

impl AddrMode
{
	pub fn from_sigils(count: usize) -> Option<AddrMode>
	{
		match count
		{
			0 => Some(AddrMode::Value),
			1 => Some(AddrMode::Direct),
			2 => Some(AddrMode::Indirect),
			_ => None,
		}
	}
}

impl fmt::Display for AddrMode
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		match self
		{
			AddrMode::Value 	=> write!(f, "value"),
			AddrMode::Direct 	=> write!(f, "direct"),
			AddrMode::Indirect 	=> write!(f, "indirect"),
		}
	}
}

// An instruction word as it lives in memory and in the image file:
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstructionWord
{
	pub index: usize,
	pub opcode: Opcode,

	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub label: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub arg: Option<i32>,

	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub mode: Option<AddrMode>,

	pub line: usize,
}

// A data word holds a value in the 32-bit signed range:
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataWord
{
	pub index: usize,

	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub label: Option<String>,

	pub value: i32,
	pub line: usize,
}

// A machine word is a tagged sum of the two shapes above.
// The decoder tries the instruction shape first (it requires "opcode"),
// then the data shape (it requires "value"); failing both is fatal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MachineWord
{
	Instruction(InstructionWord),
	Data(DataWord),
}

impl MachineWord
{
	pub fn index(&self) -> usize
	{
		match self
		{
			MachineWord::Instruction(word) 	=> word.index,
			MachineWord::Data(word) 		=> word.index,
		}
	}

	pub fn line(&self) -> usize
	{
		match self
		{
			MachineWord::Instruction(word) 	=> word.line,
			MachineWord::Data(word) 		=> word.line,
		}
	}

	pub fn label(&self) -> Option<&str>
	{
		match self
		{
			MachineWord::Instruction(word) 	=> word.label.as_deref(),
			MachineWord::Data(word) 		=> word.label.as_deref(),
		}
	}
}

// The image is the linked, address-assigned sequence of machine words.
// Invariant: words[i].index == i for all i.
#[derive(Clone, Debug, PartialEq)]
pub struct Image(pub Vec<MachineWord>);

impl Image
{
	// One word per line, like the historical format:
	pub fn encode(&self) -> String
	{
		let entries: Vec<_> = self.0.iter()
			.map(|word| serde_json::to_string(word).expect("Machine words always serialize."))
			.collect();

		format!("[{:}]", entries.join(",\n "))
	}

	pub fn decode(input: &str) -> Result<Image, serde_json::Error>
	{
		Ok(Image(serde_json::from_str(input)?))
	}

	pub fn len(&self) -> usize
	{
		self.0.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.0.is_empty()
	}

	// Locate a word by its label (used by tests and diagnostics):
	pub fn find_label(&self, label: &str) -> Option<usize>
	{
		self.0.iter().position(|word| word.label() == Some(label))
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn opcode_partitions_are_disjoint_and_total()
	{
		for opcode in Opcode::ALL_OPCODES.iter()
		{
			let memberships = [opcode.is_data_manipulation(), opcode.is_control_flow(), opcode.is_no_operand()];
			assert_eq!(memberships.iter().filter(|&&m| m).count(), 1, "{:} must be in exactly one partition", opcode);
		}
	}

	#[test]
	fn opcode_wire_names_round_trip()
	{
		for opcode in Opcode::ALL_OPCODES.iter()
		{
			assert_eq!(Opcode::from_wire_name(opcode.wire_name()), Some(*opcode));
		}
	}

	#[test]
	fn sigil_counts_map_to_modes()
	{
		assert_eq!(AddrMode::from_sigils(0), Some(AddrMode::Value));
		assert_eq!(AddrMode::from_sigils(1), Some(AddrMode::Direct));
		assert_eq!(AddrMode::from_sigils(2), Some(AddrMode::Indirect));
		assert_eq!(AddrMode::from_sigils(3), None);
	}

	#[test]
	fn codec_round_trip_is_exact()
	{
		let image = Image(vec!
		[
			MachineWord::Data(DataWord { index: 0, label: Some(String::from("int0")), value: 10, line: 0 }),
			MachineWord::Instruction(InstructionWord
			{
				index: 1,
				opcode: Opcode::Ld,
				label: Some(String::from("_start")),
				arg: Some(-42),
				mode: Some(AddrMode::Direct),
				line: 3,
			}),
			MachineWord::Instruction(InstructionWord
			{
				index: 2,
				opcode: Opcode::Hlt,
				label: None,
				arg: None,
				mode: None,
				line: 4,
			}),
		]);

		assert_eq!(Image::decode(&image.encode()).unwrap(), image);
	}

	#[test]
	fn codec_preserves_value_extremes()
	{
		let image = Image(vec!
		[
			MachineWord::Data(DataWord { index: 0, label: Some(String::from("lo")), value: i32::MIN, line: 1 }),
			MachineWord::Data(DataWord { index: 1, label: Some(String::from("hi")), value: i32::MAX, line: 2 }),
		]);

		assert_eq!(Image::decode(&image.encode()).unwrap(), image);
	}

	#[test]
	fn decoder_prefers_the_instruction_shape()
	{
		let decoded = Image::decode("[{\"index\": 0, \"opcode\": \"halt\", \"line\": 1}]").unwrap();

		match &decoded.0[0]
		{
			MachineWord::Instruction(word) 	=> assert_eq!(word.opcode, Opcode::Hlt),
			MachineWord::Data(_) 			=> panic!("A word with an opcode must decode as an instruction."),
		}
	}

	#[test]
	fn decoder_rejects_words_with_neither_shape()
	{
		assert!(Image::decode("[{\"index\": 0, \"line\": 1}]").is_err());
	}
}
